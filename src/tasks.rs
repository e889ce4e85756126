pub mod batch_flow;
pub mod batch_poller;

pub use batch_flow::{BatchFlow, BatchFlowReport, BatchHandle};
pub use batch_poller::{BatchPoller, BatchResultsSource, PollOutcome, PollState};
