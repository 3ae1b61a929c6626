use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    blocks::{
        home_view, socket_modal_view, MessageTemplate, View, DETAILS_ACTION_ID, MODAL_CALLBACK_ID,
        NAV_ACTION_PREFIX,
    },
    commands::{OrganizationsService, SlashCommandPayload, ORGS_COMMAND},
    context::BotContext,
    web::{PostedMessage, WebApiError},
};

pub const SOCKET_MODE_SHORTCUT: &str = "socket-mode";
pub const MENTION_REACTION: &str = "eyes";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    SlashCommand(SlashCommandPayload),
    Message(MessageEvent),
    AppMention(MessageEvent),
    AppHomeOpened(AppHomeOpenedEvent),
    BlockAction(BlockActionEvent),
    ViewSubmission(ViewSubmissionEvent),
    Shortcut(ShortcutEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> &str {
        match self {
            Self::SlashCommand(_) => "slash_command",
            Self::Message(_) => "message",
            Self::AppMention(_) => "app_mention",
            Self::AppHomeOpened(_) => "app_home_opened",
            Self::BlockAction(_) => "block_actions",
            Self::ViewSubmission(_) => "view_submission",
            Self::Shortcut(_) => "shortcut",
            Self::Unsupported { event_type } => event_type,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub ts: String,
    pub user_id: Option<String>,
    pub text: String,
    pub bot_id: Option<String>,
    pub subtype: Option<String>,
}

impl MessageEvent {
    /// Messages posted by bots or carrying a subtype (edits, joins) never
    /// trigger replies.
    pub fn is_from_bot(&self) -> bool {
        self.bot_id.is_some() || self.subtype.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppHomeOpenedEvent {
    pub user_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockActionEvent {
    pub channel_id: Option<String>,
    pub message_ts: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub action_id: String,
    pub block_id: Option<String>,
    pub value: Option<String>,
}

impl BlockActionEvent {
    /// The message the clicked button lives on, when it lives on one.
    pub fn message_target(&self) -> Option<PostedMessage> {
        Some(PostedMessage { channel: self.channel_id.clone()?, ts: self.message_ts.clone()? })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSubmissionEvent {
    pub callback_id: String,
    pub user_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortcutEvent {
    pub callback_id: String,
    pub trigger_id: String,
    pub user_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(MessageTemplate),
    Published(View),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Web(#[from] WebApiError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

/// Where a handler is mounted in the registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Messages whose text contains the pattern.
    Message(String),
    Command(String),
    /// Block actions whose `action_id` starts with the prefix.
    Action(String),
    ViewSubmission(String),
    Shortcut(String),
    AppMention,
    AppHomeOpened,
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn route(&self) -> Route;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    exact: HashMap<Route, Arc<dyn EventHandler>>,
    messages: Vec<(String, Arc<dyn EventHandler>)>,
    actions: Vec<(String, Arc<dyn EventHandler>)>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        let handler: Arc<dyn EventHandler> = Arc::new(handler);
        match handler.route() {
            Route::Message(pattern) => self.messages.push((pattern, handler)),
            Route::Action(prefix) => self.actions.push((prefix, handler)),
            route => {
                self.exact.insert(route, handler);
            }
        }
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.resolve(&envelope.event) else {
            debug!(
                event_name = "dispatch.unrouted",
                correlation_id = %ctx.correlation_id,
                event_type = envelope.event.event_type(),
                "no handler registered for event"
            );
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    fn resolve(&self, event: &SlackEvent) -> Option<&Arc<dyn EventHandler>> {
        match event {
            SlackEvent::SlashCommand(payload) => {
                self.exact.get(&Route::Command(payload.command.clone()))
            }
            SlackEvent::Message(message) if !message.is_from_bot() => self
                .messages
                .iter()
                .find(|(pattern, _)| message.text.contains(pattern.as_str()))
                .map(|(_, handler)| handler),
            SlackEvent::AppMention(message) if !message.is_from_bot() => {
                self.exact.get(&Route::AppMention)
            }
            SlackEvent::AppHomeOpened(_) => self.exact.get(&Route::AppHomeOpened),
            SlackEvent::BlockAction(action) => self
                .actions
                .iter()
                .filter(|(prefix, _)| action.action_id.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len())
                .map(|(_, handler)| handler),
            SlackEvent::ViewSubmission(view) => {
                self.exact.get(&Route::ViewSubmission(view.callback_id.clone()))
            }
            SlackEvent::Shortcut(shortcut) => {
                self.exact.get(&Route::Shortcut(shortcut.callback_id.clone()))
            }
            SlackEvent::Message(_) | SlackEvent::AppMention(_) | SlackEvent::Unsupported { .. } => {
                None
            }
        }
    }

    pub fn handler_count(&self) -> usize {
        self.exact.len() + self.messages.len() + self.actions.len()
    }
}

pub fn default_dispatcher(bot: Arc<BotContext>) -> EventDispatcher {
    let organizations = Arc::new(OrganizationsService::new(bot.clone()));
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(ReplyHandler::new("hello", "hey there", bot.clone()));
    dispatcher.register(ReplyHandler::new("ping", "pong", bot.clone()));
    dispatcher.register(MentionHandler::new(bot.clone()));
    dispatcher.register(OrganizationsCommandHandler::new(organizations.clone()));
    dispatcher.register(NavigationHandler::new(organizations.clone()));
    dispatcher.register(DetailsHandler::new(organizations));
    dispatcher.register(ShortcutHandler::new(bot.clone()));
    dispatcher.register(ModalSubmissionHandler);
    dispatcher.register(HomeTabHandler::new(bot));
    dispatcher
}

/// Answers any human message containing `pattern` with a fixed line.
pub struct ReplyHandler {
    pattern: String,
    reply: String,
    bot: Arc<BotContext>,
}

impl ReplyHandler {
    pub fn new(pattern: impl Into<String>, reply: impl Into<String>, bot: Arc<BotContext>) -> Self {
        Self { pattern: pattern.into(), reply: reply.into(), bot }
    }
}

#[async_trait]
impl EventHandler for ReplyHandler {
    fn route(&self) -> Route {
        Route::Message(self.pattern.clone())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        info!(
            event_name = "message.reply",
            correlation_id = %ctx.correlation_id,
            pattern = %self.pattern,
            "replying to message"
        );
        let message = MessageTemplate::text(self.reply.clone());
        self.bot.web.post_message(&event.channel_id, None, &message).await?;
        Ok(HandlerResult::Responded(message))
    }
}

pub struct MentionHandler {
    bot: Arc<BotContext>,
}

impl MentionHandler {
    pub fn new(bot: Arc<BotContext>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl EventHandler for MentionHandler {
    fn route(&self) -> Route {
        Route::AppMention
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::AppMention(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        info!(
            event_name = "event.app_mention",
            correlation_id = %ctx.correlation_id,
            "app mentioned"
        );
        if let Err(error) =
            self.bot.web.add_reaction(&event.channel_id, &event.ts, MENTION_REACTION).await
        {
            warn!(
                event_name = "event.app_mention.reaction_failed",
                correlation_id = %ctx.correlation_id,
                error = %error,
                "could not react to mention"
            );
        }

        let message = MessageTemplate::text("Hey");
        self.bot.web.post_message(&event.channel_id, None, &message).await?;
        Ok(HandlerResult::Responded(message))
    }
}

pub struct OrganizationsCommandHandler {
    service: Arc<OrganizationsService>,
}

impl OrganizationsCommandHandler {
    pub fn new(service: Arc<OrganizationsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for OrganizationsCommandHandler {
    fn route(&self) -> Route {
        Route::Command(ORGS_COMMAND.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        self.service.list(payload, ctx).await.map(HandlerResult::Responded)
    }
}

pub struct NavigationHandler {
    service: Arc<OrganizationsService>,
}

impl NavigationHandler {
    pub fn new(service: Arc<OrganizationsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for NavigationHandler {
    fn route(&self) -> Route {
        Route::Action(NAV_ACTION_PREFIX.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::BlockAction(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(match self.service.navigate(event, ctx).await? {
            Some(message) => HandlerResult::Responded(message),
            None => HandlerResult::Processed,
        })
    }
}

pub struct DetailsHandler {
    service: Arc<OrganizationsService>,
}

impl DetailsHandler {
    pub fn new(service: Arc<OrganizationsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for DetailsHandler {
    fn route(&self) -> Route {
        Route::Action(DETAILS_ACTION_ID.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::BlockAction(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(match self.service.details(event, ctx).await? {
            Some(message) => HandlerResult::Responded(message),
            None => HandlerResult::Processed,
        })
    }
}

pub struct ShortcutHandler {
    bot: Arc<BotContext>,
}

impl ShortcutHandler {
    pub fn new(bot: Arc<BotContext>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl EventHandler for ShortcutHandler {
    fn route(&self) -> Route {
        Route::Shortcut(SOCKET_MODE_SHORTCUT.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Shortcut(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let view = socket_modal_view();
        self.bot.web.open_view(&event.trigger_id, &view).await?;
        info!(
            event_name = "shortcut.modal_opened",
            correlation_id = %ctx.correlation_id,
            callback_id = %view.callback_id,
            "opened modal"
        );
        Ok(HandlerResult::Published(view))
    }
}

/// Submissions of the socket modal only need the envelope ack.
pub struct ModalSubmissionHandler;

#[async_trait]
impl EventHandler for ModalSubmissionHandler {
    fn route(&self) -> Route {
        Route::ViewSubmission(MODAL_CALLBACK_ID.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ViewSubmission(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        debug!(
            event_name = "view.submitted",
            correlation_id = %ctx.correlation_id,
            callback_id = %event.callback_id,
            "modal submitted"
        );
        Ok(HandlerResult::Processed)
    }
}

pub struct HomeTabHandler {
    bot: Arc<BotContext>,
}

impl HomeTabHandler {
    pub fn new(bot: Arc<BotContext>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl EventHandler for HomeTabHandler {
    fn route(&self) -> Route {
        Route::AppHomeOpened
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::AppHomeOpened(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let view = home_view();
        match self.bot.web.publish_view(&event.user_id, &view).await {
            Ok(()) => {
                info!(
                    event_name = "home.published",
                    correlation_id = %ctx.correlation_id,
                    "updated home tab"
                );
                Ok(HandlerResult::Published(view))
            }
            Err(error) => {
                warn!(
                    event_name = "home.publish_failed",
                    correlation_id = %ctx.correlation_id,
                    error = %error,
                    "error publishing home tab"
                );
                Ok(HandlerResult::Processed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use merakibot_core::{ApiAccess, Organization, OrganizationId};
    use merakibot_meraki::{DashboardApi, DashboardError};
    use secrecy::SecretString;
    use tokio::sync::Mutex;

    use super::{
        default_dispatcher, AppHomeOpenedEvent, BlockActionEvent, EventContext, EventDispatcher,
        EventHandler, EventHandlerError, HandlerResult, MessageEvent, Route, ShortcutEvent,
        SlackEnvelope, SlackEvent, ViewSubmissionEvent,
    };
    use crate::{
        blocks::{MessageTemplate, View},
        commands::SlashCommandPayload,
        context::BotContext,
        web::{PostedMessage, SlackWebApi, WebApiError},
    };

    #[derive(Default)]
    struct RecordingWeb {
        calls: Mutex<Vec<String>>,
        fail_publish: bool,
    }

    impl RecordingWeb {
        async fn calls(&self) -> Vec<String> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl SlackWebApi for RecordingWeb {
        async fn post_message(
            &self,
            channel: &str,
            thread_ts: Option<&str>,
            message: &MessageTemplate,
        ) -> Result<PostedMessage, WebApiError> {
            self.calls.lock().await.push(format!(
                "post:{channel}:{}:{}",
                thread_ts.unwrap_or("-"),
                message.fallback_text
            ));
            Ok(PostedMessage { channel: channel.to_owned(), ts: "100.1".to_owned() })
        }

        async fn update_message(
            &self,
            target: &PostedMessage,
            message: &MessageTemplate,
        ) -> Result<(), WebApiError> {
            self.calls.lock().await.push(format!("update:{}:{}", target.ts, message.fallback_text));
            Ok(())
        }

        async fn add_reaction(
            &self,
            channel: &str,
            timestamp: &str,
            name: &str,
        ) -> Result<(), WebApiError> {
            self.calls.lock().await.push(format!("react:{channel}:{timestamp}:{name}"));
            Ok(())
        }

        async fn publish_view(&self, user_id: &str, view: &View) -> Result<(), WebApiError> {
            self.calls.lock().await.push(format!("publish:{user_id}:{}", view.callback_id));
            if self.fail_publish {
                return Err(WebApiError::Api("not_enabled".to_owned()));
            }
            Ok(())
        }

        async fn open_view(&self, trigger_id: &str, view: &View) -> Result<(), WebApiError> {
            self.calls.lock().await.push(format!("open:{trigger_id}:{}", view.callback_id));
            Ok(())
        }
    }

    struct StaticDashboard;

    #[async_trait]
    impl DashboardApi for StaticDashboard {
        async fn organizations(
            &self,
            _api_key: &SecretString,
        ) -> Result<Vec<Organization>, DashboardError> {
            Ok((1..=4).map(organization).collect())
        }

        async fn organization(
            &self,
            _api_key: &SecretString,
            organization_id: &OrganizationId,
        ) -> Result<Organization, DashboardError> {
            organization_id
                .0
                .parse()
                .map(organization)
                .map_err(|_| DashboardError::Status { status: 404, body: "{}".to_owned() })
        }
    }

    fn organization(index: usize) -> Organization {
        Organization {
            id: OrganizationId(index.to_string()),
            name: format!("Org {index}"),
            url: format!("https://n1.meraki.com/o/{index}"),
            api: ApiAccess { enabled: true },
            licensing: None,
            cloud: None,
        }
    }

    fn bot(web: Arc<RecordingWeb>) -> Arc<BotContext> {
        Arc::new(BotContext::new(
            web,
            Arc::new(StaticDashboard),
            Some(SecretString::from("dashboard-key")),
        ))
    }

    fn envelope(event: SlackEvent) -> SlackEnvelope {
        SlackEnvelope { envelope_id: "env-1".to_owned(), event }
    }

    fn message(text: &str) -> MessageEvent {
        MessageEvent {
            channel_id: "C1".to_owned(),
            ts: "200.1".to_owned(),
            user_id: Some("U1".to_owned()),
            text: text.to_owned(),
            ..MessageEvent::default()
        }
    }

    fn ctx() -> EventContext {
        EventContext { correlation_id: "env-1".to_owned() }
    }

    #[test]
    fn default_dispatcher_registers_handlers() {
        let dispatcher = default_dispatcher(bot(Arc::default()));
        assert_eq!(dispatcher.handler_count(), 9);
    }

    #[tokio::test]
    async fn hello_and_ping_get_fixed_replies() {
        let web = Arc::new(RecordingWeb::default());
        let dispatcher = default_dispatcher(bot(web.clone()));

        dispatcher
            .dispatch(&envelope(SlackEvent::Message(message("well hello everyone"))), &ctx())
            .await
            .expect("dispatch hello");
        dispatcher
            .dispatch(&envelope(SlackEvent::Message(message("ping"))), &ctx())
            .await
            .expect("dispatch ping");

        assert_eq!(web.calls().await, vec!["post:C1:-:hey there", "post:C1:-:pong"]);
    }

    #[tokio::test]
    async fn bot_messages_and_unmatched_text_are_ignored() {
        let web = Arc::new(RecordingWeb::default());
        let dispatcher = default_dispatcher(bot(web.clone()));

        let mut from_bot = message("hello");
        from_bot.bot_id = Some("B1".to_owned());
        let mut edited = message("ping");
        edited.subtype = Some("message_changed".to_owned());

        for event in [from_bot, edited, message("good morning")] {
            let result = dispatcher
                .dispatch(&envelope(SlackEvent::Message(event)), &ctx())
                .await
                .expect("dispatch");
            assert_eq!(result, HandlerResult::Ignored);
        }
        assert!(web.calls().await.is_empty());
    }

    #[tokio::test]
    async fn mention_reacts_then_replies() {
        let web = Arc::new(RecordingWeb::default());
        let dispatcher = default_dispatcher(bot(web.clone()));

        let result = dispatcher
            .dispatch(&envelope(SlackEvent::AppMention(message("<@B1> hi"))), &ctx())
            .await
            .expect("dispatch mention");

        assert_eq!(result, HandlerResult::Responded(MessageTemplate::text("Hey")));
        assert_eq!(web.calls().await, vec!["react:C1:200.1:eyes", "post:C1:-:Hey"]);
    }

    #[tokio::test]
    async fn unknown_command_is_ignored() {
        let dispatcher = default_dispatcher(bot(Arc::default()));
        let event = SlackEvent::SlashCommand(SlashCommandPayload {
            command: "/quote".to_owned(),
            text: String::new(),
            channel_id: "C1".to_owned(),
            user_id: "U1".to_owned(),
            user_name: "alice".to_owned(),
            request_id: "req-1".to_owned(),
        });

        let result = dispatcher.dispatch(&envelope(event), &ctx()).await.expect("dispatch");
        assert_eq!(result, HandlerResult::Ignored);
    }

    #[tokio::test]
    async fn details_action_posts_card_into_thread() {
        let web = Arc::new(RecordingWeb::default());
        let dispatcher = default_dispatcher(bot(web.clone()));
        let event = SlackEvent::BlockAction(BlockActionEvent {
            channel_id: Some("C1".to_owned()),
            message_ts: Some("100.1".to_owned()),
            user_id: "U1".to_owned(),
            user_name: "alice".to_owned(),
            action_id: "get_org".to_owned(),
            block_id: Some("orgs.item.2.v1".to_owned()),
            value: Some("get_org_2".to_owned()),
        });

        let result = dispatcher.dispatch(&envelope(event), &ctx()).await.expect("dispatch");

        assert!(matches!(result, HandlerResult::Responded(_)));
        assert_eq!(web.calls().await, vec!["post:C1:100.1:Organization Org 2 (2)"]);
    }

    #[tokio::test]
    async fn actions_route_by_longest_prefix() {
        struct Tagged(&'static str);

        #[async_trait]
        impl EventHandler for Tagged {
            fn route(&self) -> Route {
                Route::Action(self.0.to_owned())
            }

            async fn handle(
                &self,
                _envelope: &SlackEnvelope,
                _ctx: &EventContext,
            ) -> Result<HandlerResult, EventHandlerError> {
                Ok(HandlerResult::Responded(MessageTemplate::text(self.0)))
            }
        }

        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(Tagged("orgs."));
        dispatcher.register(Tagged("orgs.nav."));

        let event = SlackEvent::BlockAction(BlockActionEvent {
            action_id: "orgs.nav.next.v1".to_owned(),
            ..BlockActionEvent::default()
        });
        let result = dispatcher.dispatch(&envelope(event), &ctx()).await.expect("dispatch");
        assert_eq!(result, HandlerResult::Responded(MessageTemplate::text("orgs.nav.")));

        let event = SlackEvent::BlockAction(BlockActionEvent {
            action_id: "home.click_me.v1".to_owned(),
            ..BlockActionEvent::default()
        });
        let result = dispatcher.dispatch(&envelope(event), &ctx()).await.expect("dispatch");
        assert_eq!(result, HandlerResult::Ignored);
    }

    #[tokio::test]
    async fn shortcut_opens_socket_modal() {
        let web = Arc::new(RecordingWeb::default());
        let dispatcher = default_dispatcher(bot(web.clone()));
        let event = SlackEvent::Shortcut(ShortcutEvent {
            callback_id: "socket-mode".to_owned(),
            trigger_id: "T123".to_owned(),
            user_id: "U1".to_owned(),
        });

        let result = dispatcher.dispatch(&envelope(event), &ctx()).await.expect("dispatch");

        assert!(matches!(result, HandlerResult::Published(View { ref callback_id, .. })
            if callback_id == "socket_modal_submission"));
        assert_eq!(web.calls().await, vec!["open:T123:socket_modal_submission"]);
    }

    #[tokio::test]
    async fn modal_submission_is_acknowledged_without_reply() {
        let web = Arc::new(RecordingWeb::default());
        let dispatcher = default_dispatcher(bot(web.clone()));
        let event = SlackEvent::ViewSubmission(ViewSubmissionEvent {
            callback_id: "socket_modal_submission".to_owned(),
            user_id: "U1".to_owned(),
        });

        let result = dispatcher.dispatch(&envelope(event), &ctx()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
        assert!(web.calls().await.is_empty());
    }

    #[tokio::test]
    async fn home_tab_publish_failure_is_swallowed() {
        let web = Arc::new(RecordingWeb { fail_publish: true, ..RecordingWeb::default() });
        let dispatcher = default_dispatcher(bot(web.clone()));
        let event =
            SlackEvent::AppHomeOpened(AppHomeOpenedEvent { user_id: "U9".to_owned() });

        let result = dispatcher.dispatch(&envelope(event), &ctx()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
        assert_eq!(web.calls().await, vec!["publish:U9:home_view"]);
    }

    #[test]
    fn block_action_target_needs_channel_and_timestamp() {
        let mut event = BlockActionEvent {
            channel_id: Some("C1".to_owned()),
            message_ts: Some("1.2".to_owned()),
            ..BlockActionEvent::default()
        };
        assert_eq!(
            event.message_target(),
            Some(PostedMessage { channel: "C1".to_owned(), ts: "1.2".to_owned() })
        );

        event.message_ts = None;
        assert_eq!(event.message_target(), None);
    }
}
