// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Mock partition manager for testing.
//!
//! An in-memory model of the callee side of the interface, backed by the
//! same shared buffer as [`MockMemory`](crate::memory::MockMemory) so that
//! indirect messages genuinely travel through the registered buffers. The
//! mock supports the fault-injection controls the conformance tests need:
//! programmable busy responses, reserved-field poisoning, per-operation
//! unsupported markers, and caller impersonation for capability checks.
//!
//! This models the callee only as far as tests require; it is test
//! tooling, not an implementation of the manager side of the protocol.

use std::vec::Vec;

use ffval_abi::{
    AbiFunc, CallRegs, EndpointId, Handle, MAX_MSG_SIZE, PAGE_SIZE_4K, REG_COUNT, RegWidth,
    StatusCode, Version,
};

use crate::conduit::Conduit;
use crate::memory::SharedMem;

/// Registered send/receive buffer pair, by physical address.
struct MailboxRecord {
    tx_pa: u64,
    rx_pa: u64,
    page_count: u32,
}

/// A message delivered into the receive buffer, awaiting a wait/poll.
struct QueuedMessage {
    sender: EndpointId,
    receiver: EndpointId,
    len: usize,
}

/// One in-flight memory transaction on the callee side.
struct ShareRecord {
    handle: Handle,
    owner: EndpointId,
    borrower: EndpointId,
    retrieved: bool,
}

/// A mock callee implementing the partition manager side of every call the
/// conformance core issues.
pub struct MockPartitionManager {
    mem: SharedMem,
    base: u64,
    version: Version,
    /// Identity of the calling endpoint, settable via [`Self::impersonate`].
    caller: EndpointId,
    /// Function ids reported unimplemented by the features query and
    /// rejected when invoked.
    unsupported: Vec<u32>,
    mailbox: Option<MailboxRecord>,
    /// True while the caller owns the receive buffer (after a delivery,
    /// until it releases).
    rx_owned_by_caller: bool,
    /// Remaining number of busy responses to message sends.
    busy_budget: u32,
    queued: Option<QueuedMessage>,
    shares: Vec<ShareRecord>,
    next_handle: u64,
    /// One-shot: poison this result slot with a nonzero value.
    poison_slot: Option<usize>,
    /// One-shot: poison a result slot of the next reply to this function
    /// id, leaving unrelated replies clean.
    poison_for: Option<(u64, usize)>,
    /// Every function id received, in order.
    calls: Vec<u64>,
}

impl MockPartitionManager {
    /// Creates a mock callee over the given shared storage.
    ///
    /// `base` must equal the base address of the paired `MockMemory`; the
    /// identity translation maps physical addresses into the same buffer.
    #[must_use]
    pub fn new(mem: SharedMem, base: u64) -> Self {
        Self {
            mem,
            base,
            version: Version::new(1, 1),
            caller: EndpointId::new(0x8001),
            unsupported: Vec::new(),
            mailbox: None,
            rx_owned_by_caller: false,
            busy_budget: 0,
            queued: None,
            shares: Vec::new(),
            next_handle: 0xB000_0000,
            poison_slot: None,
            poison_for: None,
            calls: Vec::new(),
        }
    }

    // ── Test controls ────────────────────────────────────────────────

    /// Sets the endpoint identity attributed to subsequent calls.
    pub fn impersonate(&mut self, id: EndpointId) {
        self.caller = id;
    }

    /// Makes the next `n` message sends answer busy.
    pub fn set_busy_budget(&mut self, n: u32) {
        self.busy_budget = n;
    }

    /// Poisons result slot `slot` of the next reply with a nonzero value.
    pub fn poison_reserved_slot(&mut self, slot: usize) {
        assert!(slot < REG_COUNT);
        self.poison_slot = Some(slot);
    }

    /// Poisons result slot `slot` of the next reply to `func` only.
    pub fn poison_reply_of(&mut self, func: AbiFunc, width: RegWidth, slot: usize) {
        assert!(slot < REG_COUNT);
        self.poison_for = Some((u64::from(func.id(width)), slot));
    }

    /// Marks an operation as unimplemented at the given width.
    pub fn mark_unsupported(&mut self, func: AbiFunc, width: RegWidth) {
        self.unsupported.push(func.id(width));
    }

    /// Number of calls received with the given function id.
    #[must_use]
    pub fn calls_to(&self, func: AbiFunc, width: RegWidth) -> usize {
        let id = u64::from(func.id(width));
        self.calls.iter().filter(|&&fid| fid == id).count()
    }

    /// Whether a buffer pair is currently registered.
    #[must_use]
    pub fn mailbox_registered(&self) -> bool {
        self.mailbox.is_some()
    }

    // ── Reply builders ───────────────────────────────────────────────

    fn success32() -> CallRegs {
        CallRegs::new(u64::from(AbiFunc::Success.id(RegWidth::Bits32)))
    }

    fn error(code: StatusCode) -> CallRegs {
        let mut reply = CallRegs::new(u64::from(AbiFunc::Error.id(RegWidth::Bits32)));
        reply.arg2 = code.to_reg();
        reply
    }

    fn finish(&mut self, fid: u64, reply: CallRegs) -> CallRegs {
        let slot = match (self.poison_slot.take(), self.poison_for) {
            (Some(slot), _) => Some(slot),
            (None, Some((target, slot))) if target == fid => {
                self.poison_for = None;
                Some(slot)
            }
            _ => None,
        };
        match slot {
            Some(slot) => {
                let mut words = reply.to_array();
                words[slot] |= 0xDEAD;
                CallRegs::from_array(words)
            }
            None => reply,
        }
    }

    // ── Handlers ─────────────────────────────────────────────────────

    fn handle_version(&self, regs: &CallRegs) -> CallRegs {
        // The callee answers with the lower of the two versions; the mock
        // only speaks one, so echo it if the caller is not older.
        let requested = Version::from_reg(regs.arg1);
        let agreed = if requested < self.version {
            requested
        } else {
            self.version
        };
        CallRegs::new(agreed.to_reg())
    }

    fn handle_id_get(&self) -> CallRegs {
        let mut reply = Self::success32();
        reply.arg2 = u64::from(self.caller.as_u16());
        reply
    }

    fn handle_features(&self, regs: &CallRegs) -> CallRegs {
        let queried = regs.arg1 as u32;
        let known = AbiFunc::from_id(queried).is_some();
        if !known || self.unsupported.contains(&queried) {
            return Self::error(StatusCode::NotSupported);
        }
        Self::success32()
    }

    fn handle_rxtx_map(&mut self, regs: &CallRegs) -> CallRegs {
        let tx_pa = regs.arg1;
        let rx_pa = regs.arg2;
        let page_count = regs.arg3 as u32;

        if tx_pa % PAGE_SIZE_4K as u64 != 0 || rx_pa % PAGE_SIZE_4K as u64 != 0 || page_count == 0
        {
            return Self::error(StatusCode::InvalidParameters);
        }
        if self.mailbox.is_some() {
            return Self::error(StatusCode::Denied);
        }
        self.mailbox = Some(MailboxRecord {
            tx_pa,
            rx_pa,
            page_count,
        });
        self.rx_owned_by_caller = false;
        Self::success32()
    }

    fn handle_rxtx_unmap(&mut self) -> CallRegs {
        if self.mailbox.is_none() {
            return Self::error(StatusCode::Denied);
        }
        self.mailbox = None;
        self.queued = None;
        Self::success32()
    }

    fn handle_rx_release(&mut self) -> CallRegs {
        if !self.rx_owned_by_caller {
            return Self::error(StatusCode::Denied);
        }
        self.rx_owned_by_caller = false;
        Self::success32()
    }

    fn handle_msg_send(&mut self, regs: &CallRegs) -> CallRegs {
        let Some(mailbox) = &self.mailbox else {
            return Self::error(StatusCode::Denied);
        };
        if self.busy_budget > 0 {
            self.busy_budget -= 1;
            return Self::error(StatusCode::Busy);
        }
        // Receive queue is full until the previous delivery is consumed.
        if self.queued.is_some() || self.rx_owned_by_caller {
            return Self::error(StatusCode::Busy);
        }

        let (sender, receiver) = EndpointId::unpack(regs.arg1);
        let len = regs.arg3 as usize;
        let capacity = (mailbox.page_count as usize * PAGE_SIZE_4K).min(MAX_MSG_SIZE);
        if len > capacity {
            return Self::error(StatusCode::InvalidParameters);
        }

        // Loopback delivery: copy the send buffer into the receive buffer.
        let tx_off = (mailbox.tx_pa - self.base) as usize;
        let rx_off = (mailbox.rx_pa - self.base) as usize;
        let mut mem = self.mem.borrow_mut();
        let payload: Vec<u8> = mem[tx_off..tx_off + len].to_vec();
        mem[rx_off..rx_off + len].copy_from_slice(&payload);
        drop(mem);

        self.queued = Some(QueuedMessage {
            sender,
            receiver,
            len,
        });
        Self::success32()
    }

    fn handle_msg_wait_or_poll(&mut self) -> CallRegs {
        match self.queued.take() {
            Some(message) => {
                self.rx_owned_by_caller = true;
                let mut reply = CallRegs::new(u64::from(AbiFunc::MsgSend.id(RegWidth::Bits32)));
                reply.arg1 = EndpointId::pack(message.sender, message.receiver);
                reply.arg3 = message.len as u64;
                reply
            }
            // Nothing pending: the caller must retry later. A real wait
            // would block; a single-threaded mock cannot.
            None => Self::error(StatusCode::Retry),
        }
    }

    fn handle_mem_begin(&mut self, regs: &CallRegs) -> CallRegs {
        let page_count = regs.arg4 as u32;
        let receiver = EndpointId::new(regs.arg5 as u16);
        if page_count == 0 {
            return Self::error(StatusCode::InvalidParameters);
        }

        let handle = Handle::new(self.next_handle);
        self.next_handle += 1;
        self.shares.push(ShareRecord {
            handle,
            owner: self.caller,
            borrower: receiver,
            retrieved: false,
        });

        let mut reply = Self::success32();
        reply.arg2 = handle.lo();
        reply.arg3 = handle.hi();
        reply
    }

    fn share_index(&self, handle: Handle) -> Option<usize> {
        self.shares.iter().position(|s| s.handle == handle)
    }

    fn handle_mem_retrieve(&mut self, regs: &CallRegs) -> CallRegs {
        let handle = Handle::from_parts(regs.arg1, regs.arg2);
        let Some(index) = self.share_index(handle) else {
            return Self::error(StatusCode::InvalidParameters);
        };
        let record = &mut self.shares[index];
        if self.caller != record.borrower {
            return Self::error(StatusCode::Denied);
        }
        if record.retrieved {
            return Self::error(StatusCode::Denied);
        }
        record.retrieved = true;

        let mut reply = CallRegs::new(u64::from(AbiFunc::MemRetrieveResp.id(RegWidth::Bits32)));
        reply.arg2 = handle.lo();
        reply.arg3 = handle.hi();
        reply
    }

    fn handle_mem_relinquish(&mut self, regs: &CallRegs) -> CallRegs {
        let handle = Handle::from_parts(regs.arg1, regs.arg2);
        let Some(index) = self.share_index(handle) else {
            return Self::error(StatusCode::InvalidParameters);
        };
        let record = &mut self.shares[index];
        if self.caller != record.borrower || !record.retrieved {
            return Self::error(StatusCode::Denied);
        }
        record.retrieved = false;
        Self::success32()
    }

    fn handle_mem_reclaim(&mut self, regs: &CallRegs) -> CallRegs {
        let handle = Handle::from_parts(regs.arg1, regs.arg2);
        let Some(index) = self.share_index(handle) else {
            return Self::error(StatusCode::InvalidParameters);
        };
        let record = &self.shares[index];
        if self.caller != record.owner {
            return Self::error(StatusCode::Denied);
        }
        // A borrower still holding access blocks the reclaim.
        if record.retrieved {
            return Self::error(StatusCode::Denied);
        }
        self.shares.remove(index);
        Self::success32()
    }
}

impl Conduit for MockPartitionManager {
    fn call(&mut self, regs: CallRegs) -> CallRegs {
        self.calls.push(regs.fid);

        let Some((func, _width)) = AbiFunc::from_id(regs.fid as u32) else {
            return self.finish(regs.fid, Self::error(StatusCode::NotSupported));
        };
        if self.unsupported.contains(&(regs.fid as u32)) {
            return self.finish(regs.fid, Self::error(StatusCode::NotSupported));
        }

        let reply = match func {
            AbiFunc::Version => self.handle_version(&regs),
            AbiFunc::IdGet => self.handle_id_get(),
            AbiFunc::Features => self.handle_features(&regs),
            AbiFunc::RxTxMap => self.handle_rxtx_map(&regs),
            AbiFunc::RxTxUnmap => self.handle_rxtx_unmap(),
            AbiFunc::RxRelease => self.handle_rx_release(),
            AbiFunc::MsgSend => self.handle_msg_send(&regs),
            AbiFunc::MsgWait | AbiFunc::MsgPoll => self.handle_msg_wait_or_poll(),
            AbiFunc::MemDonate | AbiFunc::MemLend | AbiFunc::MemShare => {
                self.handle_mem_begin(&regs)
            }
            AbiFunc::MemRetrieveReq => self.handle_mem_retrieve(&regs),
            AbiFunc::MemRelinquish => self.handle_mem_relinquish(&regs),
            AbiFunc::MemReclaim => self.handle_mem_reclaim(&regs),
            AbiFunc::Yield | AbiFunc::Run => Self::success32(),
            _ => Self::error(StatusCode::NotSupported),
        };
        self.finish(regs.fid, reply)
    }
}
