use merakibot_core::{
    navigation_controls, NavControl, Organization, PageSize, PaginationError, Partition,
};
use serde::Serialize;

pub const ORGS_COMMAND_USAGE: &str = "/meraki-orgs [perPage] [page]";
pub const DETAILS_ACTION_ID: &str = "get_org";
pub const DETAILS_VALUE_PREFIX: &str = "get_org_";
pub const NAV_ACTION_PREFIX: &str = "orgs.nav.";
pub const MODAL_CALLBACK_ID: &str = "socket_modal_submission";
pub const HOME_CALLBACK_ID: &str = "home_view";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text } | Self::Mrkdwn { text } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            value: None,
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockElement {
    Button(ButtonElement),
}

impl BlockElement {
    pub fn as_button(&self) -> Option<&ButtonElement> {
        match self {
            Self::Button(button) => Some(button),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    PlainTextInput { action_id: String },
    ExternalSelect { action_id: String, min_query_length: u32, placeholder: TextObject },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        block_id: String,
        text: TextObject,
        #[serde(skip_serializing_if = "Option::is_none")]
        accessory: Option<BlockElement>,
    },
    Divider {
        block_id: String,
    },
    Actions {
        block_id: String,
        elements: Vec<BlockElement>,
    },
    Context {
        block_id: String,
        elements: Vec<TextObject>,
    },
    Input {
        block_id: String,
        label: TextObject,
        element: InputElement,
    },
}

impl Block {
    pub fn block_id(&self) -> &str {
        match self {
            Self::Section { block_id, .. }
            | Self::Divider { block_id }
            | Self::Actions { block_id, .. }
            | Self::Context { block_id, .. }
            | Self::Input { block_id, .. } => block_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

impl MessageTemplate {
    /// A plain status line with no blocks.
    pub fn text(text: impl Into<String>) -> Self {
        Self { fallback_text: text.into(), blocks: Vec::new() }
    }
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        let (text, accessory) = builder.build();
        self.blocks.push(Block::Section { block_id: block_id.into(), text, accessory });
        self
    }

    pub fn divider(mut self, block_id: impl Into<String>) -> Self {
        self.blocks.push(Block::Divider { block_id: block_id.into() });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn input(
        mut self,
        block_id: impl Into<String>,
        label: impl Into<String>,
        element: InputElement,
    ) -> Self {
        self.blocks.push(Block::Input {
            block_id: block_id.into(),
            label: TextObject::plain(label),
            element,
        });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
    accessory: Option<BlockElement>,
}

impl SectionBuilder {
    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.accessory = Some(BlockElement::Button(button));
        self
    }

    fn build(self) -> (TextObject, Option<BlockElement>) {
        (self.text.unwrap_or_else(|| TextObject::plain("")), self.accessory)
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<BlockElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(BlockElement::Button(button));
        self
    }

    fn build(self) -> Vec<BlockElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Home,
    Modal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct View {
    #[serde(rename = "type")]
    pub kind: ViewKind,
    pub callback_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<TextObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<TextObject>,
    pub blocks: Vec<Block>,
}

impl View {
    pub fn home(callback_id: impl Into<String>, content: MessageTemplate) -> Self {
        Self {
            kind: ViewKind::Home,
            callback_id: callback_id.into(),
            title: None,
            submit: None,
            close: None,
            blocks: content.blocks,
        }
    }

    pub fn modal(
        callback_id: impl Into<String>,
        title: impl Into<String>,
        content: MessageTemplate,
    ) -> Self {
        Self {
            kind: ViewKind::Modal,
            callback_id: callback_id.into(),
            title: Some(TextObject::plain(title)),
            submit: None,
            close: None,
            blocks: content.blocks,
        }
    }

    pub fn submit(mut self, label: impl Into<String>) -> Self {
        self.submit = Some(TextObject::plain(label));
        self
    }

    pub fn close(mut self, label: impl Into<String>) -> Self {
        self.close = Some(TextObject::plain(label));
        self
    }
}

/// One rendered page of the organization list, split into the segments the
/// message is assembled from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPayload {
    pub header: Vec<Block>,
    pub body: Vec<Block>,
    pub footer: Vec<Block>,
    pub navigation: Option<Block>,
}

impl RenderedPayload {
    pub fn blocks(&self) -> Vec<Block> {
        self.header
            .iter()
            .chain(&self.body)
            .chain(&self.footer)
            .chain(&self.navigation)
            .cloned()
            .collect()
    }

    pub fn into_message(self, fallback_text: impl Into<String>) -> MessageTemplate {
        let blocks = self.blocks();
        MessageTemplate { fallback_text: fallback_text.into(), blocks }
    }
}

pub fn render_organizations_page(
    user_name: &str,
    partition: &Partition<Organization>,
    requested_page: i64,
) -> Result<RenderedPayload, PaginationError> {
    partition.page_size().check_limit()?;
    let page = partition.checked_page(requested_page)?;
    let organizations = partition.page(page).unwrap_or_default();
    let page_count = partition.page_count();
    let page_size = partition.page_size();

    let header = MessageBuilder::new("")
        .section("orgs.header.greeting.v1", |section| {
            section.mrkdwn(format!(
                "Hello,  *{}*.\n\n *These are your managed organizations:*",
                escape_mrkdwn(user_name)
            ));
        })
        .divider("orgs.header.divider.v1")
        .build()
        .blocks;

    let body = organizations
        .iter()
        .fold(MessageBuilder::new(""), |builder, organization| {
            builder.section(format!("orgs.item.{}.v1", organization.id), |section| {
                section
                    .mrkdwn(format!(
                        "*{}*\nAPI enabled: {}\n URL: <{}>",
                        escape_mrkdwn(&organization.name),
                        api_indicator(organization.api_enabled()),
                        escape_mrkdwn(&organization.url)
                    ))
                    .button(
                        ButtonElement::new(DETAILS_ACTION_ID, "Details")
                            .value(format!("{DETAILS_VALUE_PREFIX}{}", organization.id)),
                    );
            })
        })
        .build()
        .blocks;

    let footer = MessageBuilder::new("")
        .divider("orgs.footer.divider.v1")
        .context("orgs.footer.summary.v1", |context| {
            context.mrkdwn(format!(
                "Showing *{page_size}* out of *{}* | Page *{page}* of *{page_count}*",
                partition.total_items()
            ));
        })
        .build()
        .blocks;

    let navigation = navigation_controls(page, page_count).map(|controls| {
        let mut elements = Vec::with_capacity(controls.len());
        for control in controls {
            let value = control.value();
            elements.push(BlockElement::Button(
                ButtonElement::new(format!("{NAV_ACTION_PREFIX}{value}.v1"), nav_label(control))
                    .value(value),
            ));
        }
        Block::Actions { block_id: nav_block_id(page_size, page), elements }
    });

    Ok(RenderedPayload { header, body, footer, navigation })
}

/// Escapes the three characters Slack treats as control sequences in mrkdwn.
pub fn escape_mrkdwn(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn api_indicator(enabled: bool) -> &'static str {
    if enabled {
        ":white_check_mark:"
    } else {
        ":x:"
    }
}

fn nav_label(control: NavControl) -> String {
    match control {
        NavControl::First => {
            "First :black_left_pointing_double_triangle_with_vertical_bar:".to_owned()
        }
        NavControl::Previous => "Previous :arrow_backward:".to_owned(),
        NavControl::Next => "Next :arrow_forward:".to_owned(),
        NavControl::Last => {
            "Last :black_right_pointing_double_triangle_with_vertical_bar:".to_owned()
        }
        NavControl::Page(page) => page.to_string(),
    }
}

/// The navigation row's block id records the page size and current page, so
/// a click carries everything needed to render the next view.
pub fn nav_block_id(page_size: PageSize, page: usize) -> String {
    format!("{NAV_ACTION_PREFIX}{page_size}.{page}.v1")
}

pub fn parse_nav_block_id(block_id: &str) -> Option<(PageSize, usize)> {
    let state = block_id.strip_prefix(NAV_ACTION_PREFIX)?.strip_suffix(".v1")?;
    let (page_size, page) = state.split_once('.')?;
    Some((PageSize::new(page_size.parse().ok()?), page.parse().ok()?))
}

pub fn organization_details_message(organization: &Organization) -> MessageTemplate {
    MessageBuilder::new(format!(
        "Organization {} ({})",
        escape_mrkdwn(&organization.name),
        escape_mrkdwn(&organization.id.0)
    ))
        .section("orgs.details.summary.v1", |section| {
            section.mrkdwn(format!(
                "*{}*\nID: `{}`\nAPI enabled: {}\nURL: <{}>",
                escape_mrkdwn(&organization.name),
                escape_mrkdwn(&organization.id.0),
                api_indicator(organization.api_enabled()),
                escape_mrkdwn(&organization.url)
            ));
        })
        .context("orgs.details.context.v1", |context| {
            context.mrkdwn(format!(
                "Licensing: *{}* | Cloud region: *{}*",
                organization.licensing_model().unwrap_or("unknown"),
                organization.cloud_region().unwrap_or("unknown")
            ));
        })
        .build()
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("orgs.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("orgs.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

pub fn pagination_error_message(error: &PaginationError, correlation_id: &str) -> MessageTemplate {
    let summary = match error {
        PaginationError::InvalidArgument { token } => format!(
            "`{token}` is not a whole number. Usage: `{ORGS_COMMAND_USAGE}`, e.g. `/meraki-orgs 5 2`."
        ),
        PaginationError::PageOutOfRange { requested, page_count } => format!(
            "Page {requested} does not exist. Pick a page between 1 and {page_count} with `{ORGS_COMMAND_USAGE}`."
        ),
        PaginationError::PageSizeTooLarge { requested, max } => format!(
            "{requested} organizations per page do not fit in one message. Use at most {max}, e.g. `/meraki-orgs {max}`."
        ),
    };
    error_message(&summary, correlation_id)
}

pub fn home_view() -> View {
    let content = MessageBuilder::new("Home")
        .section("home.welcome.v1", |section| {
            section.mrkdwn("*Welcome to your _App's Home_* :tada:");
        })
        .divider("home.divider.v1")
        .section("home.about.v1", |section| {
            section.mrkdwn(format!(
                "List the Meraki organizations your API key manages with `{ORGS_COMMAND_USAGE}`. Each card has a *Details* button, and the buttons under the list move between pages."
            ));
        })
        .context("home.context.v1", |context| {
            context.mrkdwn("Hello world, I guess.");
        })
        .actions("home.actions.v1", |actions| {
            actions.button(ButtonElement::new("home.click_me.v1", "Click me!"));
        })
        .build();
    View::home(HOME_CALLBACK_ID, content)
}

pub fn socket_modal_view() -> View {
    let content = MessageBuilder::new("Socket Modal")
        .input(
            "q1",
            "Write anything here!",
            InputElement::PlainTextInput { action_id: "feedback".to_owned() },
        )
        .input(
            "q2",
            "Can you tell us your favorites?",
            InputElement::ExternalSelect {
                action_id: "favorite-animal".to_owned(),
                min_query_length: 0,
                placeholder: TextObject::plain("Select your favorites"),
            },
        )
        .build();
    View::modal(MODAL_CALLBACK_ID, "Socket Modal", content).submit("Submit").close("Cancel")
}
