pub mod output;

pub use output::{
    display_call_error, display_close, display_event, display_result, display_session,
};
