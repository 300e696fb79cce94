#![cfg(feature = "redis")]

mod redis_store_test;
