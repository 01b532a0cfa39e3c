//! Account linking: tie a web session user to a Telegram chat.
//!
//! Two proofs are accepted before a link is written:
//! - a Login Widget payload whose signature checks out (`widget`)
//! - a short code issued to the web session and typed into the bot chat (`registry`)

pub mod registry;
pub mod resolver;
pub mod widget;

pub use registry::{random_code, CodeGenerator, Initiation, LinkRegistry, RedemptionResult};
pub use resolver::LinkResolver;
pub use widget::WidgetPayload;
