use std::sync::Arc;

use merakibot_core::{
    parse_page_args, partition, ApplicationError, NavControl, Organization, OrganizationId,
    PageSize,
};
use tracing::{error, info, warn};

use crate::{
    blocks::{
        self, organization_details_message, pagination_error_message, render_organizations_page,
        MessageTemplate, DETAILS_VALUE_PREFIX,
    },
    context::BotContext,
    events::{BlockActionEvent, EventContext, EventHandlerError},
    web::PostedMessage,
};

pub const ORGS_COMMAND: &str = "/meraki-orgs";
pub const PLACEHOLDER_TEXT: &str = "...";
pub const CONNECTING_TEXT: &str = "Connecting to Meraki Dashboard API...";
pub const EMPTY_TEXT: &str = "No organizations were found.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
    pub user_name: String,
    pub request_id: String,
}

/// Renders `requested_page` of `organizations`, or the guidance message when
/// the list is empty or the page does not exist.
pub fn organizations_reply(
    user_name: &str,
    organizations: Vec<Organization>,
    page_size: PageSize,
    requested_page: i64,
    correlation_id: &str,
) -> MessageTemplate {
    if organizations.is_empty() {
        return MessageTemplate::text(EMPTY_TEXT);
    }

    let pages = partition(organizations, page_size);
    let fallback = format!("{} organizations have been found.", pages.total_items());
    match render_organizations_page(user_name, &pages, requested_page) {
        Ok(payload) => payload.into_message(fallback),
        Err(error) => pagination_error_message(&error, correlation_id),
    }
}

/// The `/meraki-orgs` flow plus the interactive follow-ups on its output.
pub struct OrganizationsService {
    bot: Arc<BotContext>,
}

impl OrganizationsService {
    pub fn new(bot: Arc<BotContext>) -> Self {
        Self { bot }
    }

    pub async fn list(
        &self,
        payload: &SlashCommandPayload,
        ctx: &EventContext,
    ) -> Result<MessageTemplate, EventHandlerError> {
        let web = &self.bot.web;
        let posted = web
            .post_message(&payload.channel_id, None, &MessageTemplate::text(PLACEHOLDER_TEXT))
            .await?;

        let args = match parse_page_args(&payload.text) {
            Ok(args) => args,
            Err(error) => {
                warn!(
                    event_name = "command.orgs.invalid_arguments",
                    correlation_id = %ctx.correlation_id,
                    text = %payload.text,
                    error = %error,
                    "rejecting malformed pagination arguments"
                );
                let message = pagination_error_message(&error, &ctx.correlation_id);
                return self.finish(&posted, message, ctx).await;
            }
        };

        web.update_message(&posted, &MessageTemplate::text(CONNECTING_TEXT)).await?;

        let organizations = match self.bot.fetch_organizations().await {
            Ok(organizations) => organizations,
            Err(error) => return self.connection_failed(&posted, error, ctx).await,
        };

        info!(
            event_name = "command.orgs.fetched",
            correlation_id = %ctx.correlation_id,
            organization_count = organizations.len(),
            page_size = args.page_size.get(),
            page = args.page,
            "organizations fetched"
        );

        let message = organizations_reply(
            &payload.user_name,
            organizations,
            args.page_size,
            args.page,
            &ctx.correlation_id,
        );
        self.finish(&posted, message, ctx).await
    }

    pub async fn navigate(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError> {
        let Some(target) = event.message_target() else {
            warn!(
                event_name = "action.orgs.nav.no_message",
                correlation_id = %ctx.correlation_id,
                "navigation click without a source message"
            );
            return Ok(None);
        };
        let state = event.block_id.as_deref().and_then(blocks::parse_nav_block_id);
        let control = event.value.as_deref().and_then(NavControl::from_value);
        let (Some((page_size, current)), Some(control)) = (state, control) else {
            warn!(
                event_name = "action.orgs.nav.malformed",
                correlation_id = %ctx.correlation_id,
                block_id = event.block_id.as_deref().unwrap_or("none"),
                value = event.value.as_deref().unwrap_or("none"),
                "navigation click carried no usable view state"
            );
            return Ok(None);
        };

        let organizations = match self.bot.fetch_organizations().await {
            Ok(organizations) => organizations,
            Err(error) => return self.connection_failed(&target, error, ctx).await.map(Some),
        };

        let page_count = organizations.len().div_ceil(page_size.get());
        let page = control.resolve(current, page_count);
        info!(
            event_name = "action.orgs.nav",
            correlation_id = %ctx.correlation_id,
            from_page = current,
            to_page = page,
            page_count,
            "navigating organization list"
        );

        let message = organizations_reply(
            &event.user_name,
            organizations,
            page_size,
            i64::try_from(page).unwrap_or(i64::MAX),
            &ctx.correlation_id,
        );
        self.finish(&target, message, ctx).await.map(Some)
    }

    pub async fn details(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<MessageTemplate>, EventHandlerError> {
        let Some(organization_id) = event
            .value
            .as_deref()
            .and_then(|value| value.strip_prefix(DETAILS_VALUE_PREFIX))
            .filter(|id| !id.is_empty())
            .map(|id| OrganizationId(id.to_owned()))
        else {
            return Ok(None);
        };
        let Some(channel) = event.channel_id.as_deref() else {
            return Ok(None);
        };

        let message = match self.bot.fetch_organization(&organization_id).await {
            Ok(organization) => organization_details_message(&organization),
            Err(error) => {
                let interface = error.clone().into_interface(ctx.correlation_id.clone());
                error!(
                    event_name = "action.orgs.details_failed",
                    correlation_id = %ctx.correlation_id,
                    organization_id = %organization_id,
                    error = %error,
                    "failed to fetch organization details"
                );
                MessageTemplate::text(interface.user_message())
            }
        };

        self.bot.web.post_message(channel, event.message_ts.as_deref(), &message).await?;
        Ok(Some(message))
    }

    async fn connection_failed(
        &self,
        target: &PostedMessage,
        error: ApplicationError,
        ctx: &EventContext,
    ) -> Result<MessageTemplate, EventHandlerError> {
        let interface = error.clone().into_interface(ctx.correlation_id.clone());
        error!(
            event_name = "command.orgs.fetch_failed",
            correlation_id = %ctx.correlation_id,
            error = %error,
            "dashboard fetch failed"
        );
        self.finish(target, MessageTemplate::text(interface.user_message()), ctx).await
    }

    /// Replaces the placeholder with `message`. If Slack refuses a block
    /// message, the placeholder is replaced with a status line instead.
    async fn finish(
        &self,
        target: &PostedMessage,
        message: MessageTemplate,
        ctx: &EventContext,
    ) -> Result<MessageTemplate, EventHandlerError> {
        let Err(rejected) = self.bot.web.update_message(target, &message).await else {
            return Ok(message);
        };
        if message.blocks.is_empty() {
            return Err(rejected.into());
        }

        let interface = ApplicationError::Delivery(rejected.to_string())
            .into_interface(ctx.correlation_id.clone());
        error!(
            event_name = "command.orgs.update_rejected",
            correlation_id = %ctx.correlation_id,
            error = %rejected,
            block_count = message.blocks.len(),
            "slack rejected the rendered message; falling back to a status line"
        );
        let status = MessageTemplate::text(interface.user_message());
        self.bot.web.update_message(target, &status).await?;
        Ok(status)
    }
}
