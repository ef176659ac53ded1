//! # promdriver-stackdriver
//!
//! 정규화된 시계열을 Google Cloud Monitoring에 기록하는 [`Sink`](promdriver_core::pipeline::Sink) 구현입니다.
//!
//! - [`wire`]: `timeSeries.create` 요청 본문
//! - [`auth`]: 애플리케이션 기본 자격 증명 토큰
//! - [`client`]: REST 클라이언트

pub mod auth;
pub mod client;
pub mod wire;

pub use auth::{Credentials, GcpTokenSource, StaticToken, TokenSource};
pub use client::MonitoringClient;
