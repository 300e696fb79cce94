#![cfg(all(feature = "test-utils", feature = "failpoints"))]

mod batch_execution_test;
