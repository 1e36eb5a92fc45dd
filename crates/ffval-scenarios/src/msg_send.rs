// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 The ffval authors

//! Indirect messaging scenario: client A sends a fixed string to server B
//! twice over a freshly registered 4 KiB buffer pair, request/response
//! shaped, then releases and frees everything.
//!
//! The verdict is a skip when the feature query reports the send
//! operation unimplemented. Cleanup runs on every exit path; a cleanup
//! failure never masks the first error of the scenario body.

use ffval_abi::{AbiFunc, EndpointId, PAGE_SIZE_4K, RegWidth};
use ffval_core::conduit::Conduit;
use ffval_core::discovery;
use ffval_core::mailbox::{BufferPair, Mailbox};
use ffval_core::memory::MemoryEnv;
use ffval_core::messaging::{Messenger, RetryPolicy, wait_for_message};

use crate::verdict::{FailPoint, Verdict, record};

#[cfg(test)]
mod msg_send_test;

const GREETING: &[u8] = b"ffval indirect message";

const POINT_PROBE: FailPoint = FailPoint(1);
const POINT_ENDPOINT_ID: FailPoint = FailPoint(2);
const POINT_ALLOC: FailPoint = FailPoint(3);
const POINT_REGISTER: FailPoint = FailPoint(4);
const POINT_SEND: FailPoint = FailPoint(5);
const POINT_DELIVERY: FailPoint = FailPoint(6);
const POINT_PAYLOAD: FailPoint = FailPoint(7);
const POINT_RELEASE: FailPoint = FailPoint(8);
const POINT_UNREGISTER: FailPoint = FailPoint(9);

/// Runs the scenario against `server`.
pub fn run<C: Conduit, M: MemoryEnv>(
    conduit: &mut C,
    mem: &mut M,
    server: EndpointId,
    policy: RetryPolicy,
) -> Verdict {
    match discovery::feature_supported(conduit, AbiFunc::MsgSend, RegWidth::Bits32) {
        Ok(true) => {}
        Ok(false) => {
            log::info!("send operation unimplemented, skipping");
            return Verdict::Skip;
        }
        Err(_) => return Verdict::Fail(POINT_PROBE),
    }

    let Some(send) = mem.alloc(PAGE_SIZE_4K) else {
        return Verdict::Fail(POINT_ALLOC);
    };
    let Some(recv) = mem.alloc(PAGE_SIZE_4K) else {
        mem.free(send, PAGE_SIZE_4K);
        return Verdict::Fail(POINT_ALLOC);
    };
    let pair = BufferPair {
        send,
        recv,
        page_count: 1,
    };

    let mut mailbox = Mailbox::probe(conduit, RegWidth::Bits32);
    let mut client = discovery::EndpointCache::new();
    let mut verdict = Verdict::Pass;
    record(
        &mut verdict,
        exercise(conduit, mem, &mut mailbox, &mut client, pair, server, policy),
    );

    // Cleanup on every exit path.
    if let Ok(client) = client.get(conduit) {
        record(
            &mut verdict,
            mailbox
                .unregister(conduit, client)
                .map_err(|_| POINT_UNREGISTER),
        );
    }
    mem.free(recv, PAGE_SIZE_4K);
    mem.free(send, PAGE_SIZE_4K);
    verdict
}

fn exercise<C: Conduit, M: MemoryEnv>(
    conduit: &mut C,
    mem: &mut M,
    mailbox: &mut Mailbox,
    client: &mut discovery::EndpointCache,
    pair: BufferPair,
    server: EndpointId,
    policy: RetryPolicy,
) -> Result<(), FailPoint> {
    let client = client.get(conduit).map_err(|_| POINT_ENDPOINT_ID)?;

    mailbox
        .register(conduit, mem, pair)
        .map_err(|_| POINT_REGISTER)?;

    let mut messenger = Messenger::new(RegWidth::Bits32, policy);

    // Two transfers back to back, request/response shaped.
    for round in 0..2 {
        messenger
            .send(conduit, mem, pair.send, client, server, GREETING)
            .map_err(|_| POINT_SEND)?;

        let received = wait_for_message(conduit).map_err(|_| POINT_DELIVERY)?;
        if received.len != GREETING.len() {
            log::error!("round {round}: delivery length {} mismatch", received.len);
            return Err(POINT_DELIVERY);
        }

        let mut echoed = [0u8; GREETING.len()];
        mem.read(pair.recv, &mut echoed);
        if echoed != GREETING {
            return Err(POINT_PAYLOAD);
        }

        mailbox.release_rx(conduit).map_err(|_| POINT_RELEASE)?;
    }
    Ok(())
}
