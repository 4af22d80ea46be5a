//! GroupMe bot plumbing: the inbound callback payload and outbound reply posting.

mod message;
mod notifier;

pub use message::{GroupMeMessage, GroupMeSendRequest};
pub use notifier::{
    GroupMeConfig, GroupMeError, GroupMeNotifier, ReplyNotifier, DEFAULT_GROUPME_API_BASE,
    DEFAULT_GROUPME_TIMEOUT_MS,
};
