#![cfg(feature = "test-utils")]

mod destination_race_test;
mod sink_task_test;
