//! Call bounded context - manages the lifecycle of a live call session

pub mod aggregate;
pub mod event;
pub mod repository;
pub mod service;
pub mod transport;
pub mod value_object;

pub use aggregate::{CallSession, SessionSnapshot};
pub use event::{CallTerminated, SessionEnded, TerminationTrigger};
pub use repository::{CallDirectory, CredentialIssuer};
pub use service::CallDomainService;
pub use transport::{JoinOptions, TransportCall, TransportClient, TransportEngine};
pub use value_object::{CallTarget, ConnectionState, Role, SessionCredential};
