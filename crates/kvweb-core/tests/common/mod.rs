#![allow(dead_code)]

pub mod kv_server;
