//! Outbound email delivery through the Sendinblue transactional email API.
//!
//! A `Message` is normalized (addresses, attachments), shaped for the API
//! generation the configured endpoint points at, and POSTed as JSON:
//!
//! ```ignore
//! let settings = sibmail::config::load_settings(None)?;
//! let transport = sibmail::Transport::new(&settings)?;
//!
//! let message = sibmail::Message::new()
//!     .with_sender("Jon Doe <jon@example.com>")
//!     .with_recipients(vec!["a@example.com", "b@example.com"])
//!     .with_subject("Hello")
//!     .with_text("Hello there!");
//!
//! let result = transport.send(message).await?;
//! log::info!("Sent {}", result.message_id);
//! ```
pub mod address;
pub mod attachment;
pub mod body;
pub mod client;
pub mod compliance;
pub mod config;
pub mod email;
pub mod error;
pub mod transport;

pub use address::{Address, AddressItem, AddressNode, Addresses, Recipients};
pub use attachment::{Attachment, Content, RemoteAttachment, ResolvedAttachments};
pub use compliance::{ApiVersion, RequestBody, SendResult, VersionStrategy};
pub use config::{AttachmentPolicy, Settings};
pub use email::Message;
pub use error::Error;
pub use transport::Transport;
