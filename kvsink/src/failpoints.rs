use fail::fail_point;

use crate::bail;
use crate::error::{ErrorKind, SinkResult};

pub const EXECUTE_BATCH__BEFORE_OPERATION: &str = "execute_batch.before_operation";

pub fn sink_fail_point(name: &str) -> SinkResult<()> {
    fail_point!(name, |_| {
        bail!(
            ErrorKind::InjectedFault,
            "An error occurred in a fail point",
            format!("The failpoint '{name}' returned an error")
        );
    });

    Ok(())
}
