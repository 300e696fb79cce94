use fail::FailScenario;

/// Failpoint scenario that turns its failpoints off again when dropped.
pub struct SinkFailScenario<'a> {
    _scenario: FailScenario<'a>,
    failpoints: Vec<String>,
}

impl<'a> SinkFailScenario<'a> {
    /// Configures each `(failpoint, action)` pair, e.g. `("execute_batch.before_operation", "1*off->return")`.
    pub fn setup(failpoints: &[(&str, &str)]) -> SinkFailScenario<'a> {
        let scenario = FailScenario::setup();

        for (failpoint, action) in failpoints {
            fail::cfg(*failpoint, action).unwrap();
        }

        Self {
            _scenario: scenario,
            failpoints: failpoints
                .iter()
                .map(|(failpoint, _)| failpoint.to_string())
                .collect(),
        }
    }
}

impl Drop for SinkFailScenario<'_> {
    fn drop(&mut self) {
        for failpoint in &self.failpoints {
            fail::cfg(failpoint, "off").unwrap();
        }
    }
}
