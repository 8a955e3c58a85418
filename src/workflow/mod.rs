//! Customer-ID generation: field visibility, local validation and the
//! preview/confirm allocation protocol.

pub mod policy;
pub mod protocol;
pub mod selection;
pub mod validate;
pub mod view;

pub use policy::{ActiveFields, BranchHandling, CategoryClass, CategoryPolicy, Field};
pub use protocol::{Completion, Ticket, Workflow, WorkflowError, WorkflowState};
pub use selection::FormSelection;
pub use validate::{validate, ValidationError};
