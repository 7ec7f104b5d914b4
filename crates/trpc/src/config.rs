// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime constants and configuration.
//!
//! - **Level 1 (Static)**: wire conventions shared by clients and processors
//! - **Level 2 (Dynamic)**: `ClientConfig`, `RegistryConfig`, `ServerConfig`

use crate::payload::StorageMode;

/// Separator between service name and method name in multiplexed messages.
///
/// `"Calculator:add"` routes `add` to the processor registered as `Calculator`.
pub const MULTIPLEX_SEPARATOR: char = ':';

/// Namespace of the runtime's own types (`TApplicationException`).
pub const RUNTIME_NAMESPACE: &str = "trpc";

/// Result field holding a method's return value.
pub const SUCCESS_FIELD: &str = "success";

/// Field id of [`SUCCESS_FIELD`].
pub const SUCCESS_FIELD_ID: i16 = 0;

/// First sequence id sent by a client.
pub const INITIAL_SEQID: i32 = 0;

/// Suffix of per-method argument type names (`Service.method_args`).
pub const ARGS_SUFFIX: &str = "_args";

/// Suffix of per-method result type names (`Service.method_result`).
pub const RESULT_SUFFIX: &str = "_result";

/// Client behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientConfig {
    /// Reject replies whose method name or sequence id differ from the call.
    pub strict_replies: bool,
}

/// Registry behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryConfig {
    /// Storage used when a non-exception type definition does not choose one.
    pub default_storage: StorageMode,
}

/// What a server does when a handler fails with an undeclared error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnhandledPolicy {
    /// Stop serving and return the error.
    #[default]
    Stop,
    /// Log and keep serving; the caller gets no reply.
    Continue,
    /// Reply with an `INTERNAL_ERROR` application exception and keep serving.
    Reply,
}

/// Server behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerConfig {
    pub on_unhandled: UnhandledPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert!(!ClientConfig::default().strict_replies);
        assert_eq!(RegistryConfig::default().default_storage, StorageMode::Open);
        assert_eq!(ServerConfig::default().on_unhandled, UnhandledPolicy::Stop);
    }
}
