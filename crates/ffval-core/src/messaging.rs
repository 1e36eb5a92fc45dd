// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Indirect messaging over the registered buffer pair.
//!
//! A send is a two-party handoff: the payload is copied into the sender's
//! send buffer, the send call notifies the callee, and the receiver picks
//! the message up with a wait or poll call. The callee can answer a send
//! with the busy code as flow control; that is not a failure but a request
//! to retry, bounded here by an explicit [`RetryPolicy`] rather than an
//! open-ended loop.
//!
//! Each transfer walks an observable state machine ([`SendState`]) so a
//! conformance check can assert where a transfer stopped.

use core::fmt;

use ffval_abi::{AbiFunc, CallRegs, EndpointId, MAX_MSG_SIZE, RegWidth, StatusCode, Vaddr};

use crate::conduit::{Conduit, invoke};
use crate::memory::MemoryEnv;
use crate::validator::{self, Discriminant};


/// Reserved trailing slots in a send result: the discriminant is the only
/// payload, slots 1..8 are reserved.
const SEND_RESERVED_SLOTS: usize = 7;

/// Bounded retry policy for busy-answered sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves as one.
    pub max_attempts: u32,
    /// Busy-wait iterations between attempts.
    pub backoff_spins: u32,
}

impl RetryPolicy {
    /// Default bound: generous enough for transient receiver backlog
    /// without masking a receiver that never drains.
    pub const DEFAULT: Self = Self {
        max_attempts: 10,
        backoff_spins: 1000,
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Observable position of the most recent transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SendState {
    /// No transfer attempted yet.
    #[default]
    Idle,
    /// Payload staged, invocation in flight.
    Sending,
    /// The callee answered busy; the transfer is backing off before the
    /// next attempt.
    AwaitingAck,
    /// The callee accepted the transfer.
    Delivered,
    /// The transfer failed; the error was surfaced to the caller.
    Failed,
}

/// Successful send summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendReceipt {
    /// Attempts actually spent, including the successful one.
    pub attempts: u32,
}

/// Error sending a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendError {
    /// The send returned a non-busy error discriminant.
    Abi(StatusCode),
    /// The payload does not fit a single message; rejected before the
    /// send buffer is touched.
    Oversized {
        /// Payload length in bytes.
        len: usize,
    },
    /// A nonzero value was read in a reserved result slot.
    ReservedField,
    /// Every permitted attempt was answered busy.
    RetriesExhausted {
        /// Attempts spent before giving up.
        attempts: u32,
    },
    /// The result could not be classified as success or error.
    Malformed(u64),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abi(code) => write!(f, "message send failed: {code}"),
            Self::Oversized { len } => {
                write!(f, "payload of {len} bytes exceeds the {MAX_MSG_SIZE} byte message limit")
            }
            Self::ReservedField => write!(f, "nonzero value in reserved result slot"),
            Self::RetriesExhausted { attempts } => {
                write!(f, "receiver still busy after {attempts} send attempts")
            }
            Self::Malformed(raw) => write!(f, "unclassifiable send result {raw:#x}"),
        }
    }
}

/// A delivered message, as described by the delivery indication. The
/// payload itself is in the receive buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Received {
    /// Endpoint the message came from.
    pub sender: EndpointId,
    /// Endpoint the message was addressed to.
    pub receiver: EndpointId,
    /// Payload length in bytes.
    pub len: usize,
}

/// Error receiving a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecvError {
    /// The wait or poll returned an error discriminant.
    Abi(StatusCode),
    /// A poll found no message pending.
    Empty,
    /// The result could not be classified as a delivery or an error.
    Malformed(u64),
}

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abi(code) => write!(f, "message receive failed: {code}"),
            Self::Empty => write!(f, "no message pending"),
            Self::Malformed(raw) => write!(f, "unclassifiable receive result {raw:#x}"),
        }
    }
}

/// Indirect-message sender bound to one retry policy.
#[derive(Clone, Copy, Debug)]
pub struct Messenger {
    width: RegWidth,
    policy: RetryPolicy,
    state: SendState,
    backoffs: u32,
}

impl Messenger {
    /// Creates a messenger with the given retry policy.
    #[must_use]
    pub const fn new(width: RegWidth, policy: RetryPolicy) -> Self {
        Self {
            width,
            policy,
            state: SendState::Idle,
            backoffs: 0,
        }
    }

    /// State of the most recent transfer.
    #[must_use]
    pub const fn state(&self) -> SendState {
        self.state
    }

    /// Busy answers in the most recent send that were followed by another
    /// attempt. A busy answer on the final attempt is not backed off; the
    /// exhaustion error is returned straight away.
    #[must_use]
    pub const fn backoffs(&self) -> u32 {
        self.backoffs
    }

    /// Transfers `payload` to `receiver`.
    ///
    /// The payload is copied into the send buffer at `send_buf` and the
    /// send call issued. Busy answers are retried up to the policy bound
    /// with a spin backoff between attempts; any other error aborts
    /// immediately.
    ///
    /// A payload longer than [`MAX_MSG_SIZE`] is rejected up front: the
    /// send buffer is one message long, so a longer copy would run past
    /// it into whatever is mapped next.
    pub fn send<C: Conduit, M: MemoryEnv>(
        &mut self,
        conduit: &mut C,
        mem: &mut M,
        send_buf: Vaddr,
        sender: EndpointId,
        receiver: EndpointId,
        payload: &[u8],
    ) -> Result<SendReceipt, SendError> {
        if payload.len() > MAX_MSG_SIZE {
            return Err(SendError::Oversized { len: payload.len() });
        }
        self.backoffs = 0;
        mem.write(send_buf, payload);

        let mut regs = CallRegs::default();
        regs.arg1 = EndpointId::pack(sender, receiver);
        regs.arg3 = payload.len() as u64;

        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            self.state = SendState::Sending;
            let result = invoke(conduit, AbiFunc::MsgSend, self.width, regs);
            let outcome = validator::validate(&result, SEND_RESERVED_SLOTS);
            match outcome.discriminant {
                discriminant if discriminant.is_success() => {
                    if !outcome.reserved_ok {
                        self.state = SendState::Failed;
                        return Err(SendError::ReservedField);
                    }
                    self.state = SendState::Delivered;
                    return Ok(SendReceipt { attempts: attempt });
                }
                discriminant if discriminant.is_busy() => {
                    log::debug!("send attempt {attempt}/{max_attempts} answered busy");
                    self.state = SendState::AwaitingAck;
                    if attempt < max_attempts {
                        self.backoffs += 1;
                        backoff(self.policy.backoff_spins);
                    }
                }
                Discriminant::Error(code) => {
                    self.state = SendState::Failed;
                    return Err(SendError::Abi(code));
                }
                _ => {
                    self.state = SendState::Failed;
                    return Err(SendError::Malformed(result.fid));
                }
            }
        }
        self.state = SendState::Failed;
        Err(SendError::RetriesExhausted {
            attempts: max_attempts,
        })
    }
}

/// Blocks until a message is delivered.
pub fn wait_for_message<C: Conduit>(conduit: &mut C) -> Result<Received, RecvError> {
    let result = invoke(conduit, AbiFunc::MsgWait, RegWidth::Bits32, CallRegs::default());
    decode_delivery(&result)
}

/// Checks for a pending message without blocking.
///
/// A retry-coded error means the queue is empty, reported as
/// [`RecvError::Empty`].
pub fn poll_for_message<C: Conduit>(conduit: &mut C) -> Result<Received, RecvError> {
    let result = invoke(conduit, AbiFunc::MsgPoll, RegWidth::Bits32, CallRegs::default());
    decode_delivery(&result)
}

fn decode_delivery(result: &CallRegs) -> Result<Received, RecvError> {
    match validator::classify(result) {
        Discriminant::Other(fid) if fid as u32 == AbiFunc::MsgSend.id(RegWidth::Bits32) => {
            let (sender, receiver) = EndpointId::unpack(result.arg1);
            Ok(Received {
                sender,
                receiver,
                len: result.arg3 as usize,
            })
        }
        Discriminant::Error(StatusCode::Retry) => Err(RecvError::Empty),
        Discriminant::Error(code) => Err(RecvError::Abi(code)),
        _ => Err(RecvError::Malformed(result.fid)),
    }
}

fn backoff(spins: u32) {
    for _ in 0..spins {
        core::hint::spin_loop();
    }
}
