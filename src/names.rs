// Copyright 2022 Jeff Kim <hiking90@gmail.com>
// SPDX-License-Identifier: Apache-2.0

//! Base names of every instrument.
//!
//! The registry prefixes each with the configured prefix, so with the default
//! prefix `messaging-sent-failed` is exported as `actor-messaging-sent-failed`.

pub const MESSAGING_SENT_BYTES_HEADER: &str = "messaging-sent-header-size";
pub const MESSAGING_RECEIVED_BYTES_HEADER: &str = "messaging-received-header-size";
pub const MESSAGING_SENT_LOCAL_MESSAGES: &str = "messaging-sent-local";
pub const MESSAGING_SENT_FAILED: &str = "messaging-sent-failed";
pub const MESSAGING_SENT_DROPPED: &str = "messaging-sent-dropped";
pub const MESSAGING_REJECTED: &str = "messaging-rejected";
pub const MESSAGING_REROUTED: &str = "messaging-rerouted";
pub const MESSAGING_EXPIRED: &str = "messaging-expired";
pub const GATEWAY_CONNECTED_CLIENTS: &str = "gateway-connected-clients";
pub const MESSAGING_PINGS_SENT: &str = "messaging-pings-sent";
pub const MESSAGING_PINGS_RECEIVED: &str = "messaging-pings-received";
pub const MESSAGING_PINGS_REPLY_RECEIVED: &str = "messaging-pings-reply-received";
pub const MESSAGING_PINGS_REPLY_MISSED: &str = "messaging-pings-reply-missed";
pub const MESSAGING_SENT_MESSAGES_SIZE: &str = "messaging-sent-messages-size";
pub const MESSAGING_RECEIVED_MESSAGES_SIZE: &str = "messaging-received-messages-size";
pub const SCHEDULER_LONG_RUNNING_TURNS: &str = "scheduler-long-running-turns";
