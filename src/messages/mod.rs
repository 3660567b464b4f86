pub mod criteria;
pub mod normalize;
pub mod receipts;
pub mod service;

pub use criteria::{build_criteria, CallerIdentity, MessagesRequest, Role, SearchCriteria};
pub use normalize::{Message, MessageType};
pub use service::{MessagePage, MessageService};
