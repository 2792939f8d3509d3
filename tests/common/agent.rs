//! Tiny SNMP agent on a loopback UDP socket, for driving the real snmp2 client.
//!
//! Requests are decoded with snmp2 itself; responses are BER-encoded by hand.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use snmp2::{MessageType, Pdu, Version};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use snmp_poll_gateway::snmp::{ProtocolVersion, SessionParams};

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_IP_ADDRESS: u8 = 0x40;
const TAG_COUNTER32: u8 = 0x41;
const TAG_GAUGE32: u8 = 0x42;
const TAG_TIMETICKS: u8 = 0x43;
const TAG_COUNTER64: u8 = 0x46;
const TAG_NO_SUCH_OBJECT: u8 = 0x80;
const TAG_END_OF_MIB_VIEW: u8 = 0x82;
const TAG_RESPONSE: u8 = 0xA2;

#[derive(Debug, Clone)]
pub enum AgentValue {
    Text(Vec<u8>),
    Integer(i64),
    Counter32(u32),
    Gauge32(u32),
    Counter64(u64),
    Timeticks(u32),
    ObjectId(String),
    IpAddress([u8; 4]),
}

/// Rows the agent serves and how it misbehaves.
#[derive(Debug, Clone, Default)]
pub struct AgentScript {
    pub rows: BTreeMap<Vec<u32>, AgentValue>,
    /// Leading datagrams that are received but never answered
    pub drop_first: usize,
    /// Every GETNEXT/GETBULK step answers with the first row again
    pub repeat_rows: bool,
}

impl AgentScript {
    pub fn row(mut self, oid: &str, value: AgentValue) -> Self {
        self.rows.insert(arcs(oid), value);
        self
    }

    fn next_after(&self, oid: &[u32]) -> (Vec<u32>, Vec<u8>) {
        let next = if self.repeat_rows {
            self.rows.iter().next()
        } else {
            self.rows
                .range::<[u32], _>((Bound::Excluded(oid), Bound::Unbounded))
                .next()
        };
        match next {
            Some((key, value)) => (key.clone(), encode_value(value)),
            None => (oid.to_vec(), vec![TAG_END_OF_MIB_VIEW, 0]),
        }
    }
}

pub struct FakeAgent {
    addr: SocketAddr,
    datagrams: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl FakeAgent {
    pub async fn spawn(script: AgentScript) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let datagrams = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&datagrams);

        let task = tokio::spawn(async move {
            let mut buf = vec![0u8; 65_535];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    break;
                };
                let seen = counter.fetch_add(1, Ordering::SeqCst);
                if seen < script.drop_first {
                    continue;
                }
                if let Some(reply) = answer(&script, &buf[..len]) {
                    let _ = socket.send_to(&reply, peer).await;
                }
            }
        });

        Self {
            addr,
            datagrams,
            task,
        }
    }

    /// Requests received so far, answered or not.
    pub fn datagrams(&self) -> usize {
        self.datagrams.load(Ordering::SeqCst)
    }

    pub fn params(&self, version: ProtocolVersion, timeout_ms: u64, retries: u32) -> SessionParams {
        SessionParams {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            credential: "public".to_string(),
            version,
            timeout: Duration::from_millis(timeout_ms),
            retries,
        }
    }
}

impl Drop for FakeAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn answer(script: &AgentScript, request: &[u8]) -> Option<Vec<u8>> {
    let pdu = Pdu::from_bytes(request).ok()?;
    let version = match pdu.version().ok()? {
        Version::V1 => 0,
        Version::V2C => 1,
        _ => return None,
    };
    let requested: Vec<Vec<u32>> = pdu
        .varbinds
        .clone()
        .map(|(oid, _)| arcs(&oid.to_string()))
        .collect();

    let mut varbinds = Vec::new();
    match pdu.message_type {
        MessageType::GetRequest => {
            for oid in requested {
                let value = script
                    .rows
                    .get(&oid)
                    .map(encode_value)
                    .unwrap_or_else(|| vec![TAG_NO_SUCH_OBJECT, 0]);
                varbinds.push((oid, value));
            }
        }
        MessageType::GetNextRequest => {
            for oid in requested {
                varbinds.push(script.next_after(&oid));
            }
        }
        MessageType::GetBulkRequest => {
            // non-repeaters and max-repetitions travel in the error fields
            let repetitions = pdu.error_index.max(1);
            for oid in requested {
                let mut cursor = oid;
                for _ in 0..repetitions {
                    let (next, value) = script.next_after(&cursor);
                    let end = value[0] == TAG_END_OF_MIB_VIEW;
                    varbinds.push((next.clone(), value));
                    if end {
                        break;
                    }
                    cursor = next;
                }
            }
        }
        _ => return None,
    }

    Some(encode_response(version, pdu.community, pdu.req_id, &varbinds))
}

fn encode_response(
    version: i64,
    community: &[u8],
    req_id: i32,
    varbinds: &[(Vec<u32>, Vec<u8>)],
) -> Vec<u8> {
    let list: Vec<u8> = varbinds
        .iter()
        .flat_map(|(oid, value)| {
            tlv(
                TAG_SEQUENCE,
                &[tlv(TAG_OID, &encode_arcs(oid)), value.clone()].concat(),
            )
        })
        .collect();
    let body = [
        integer(i64::from(req_id)),
        integer(0),
        integer(0),
        tlv(TAG_SEQUENCE, &list),
    ]
    .concat();
    tlv(
        TAG_SEQUENCE,
        &[
            integer(version),
            tlv(TAG_OCTET_STRING, community),
            tlv(TAG_RESPONSE, &body),
        ]
        .concat(),
    )
}

fn encode_value(value: &AgentValue) -> Vec<u8> {
    match value {
        AgentValue::Text(bytes) => tlv(TAG_OCTET_STRING, bytes),
        AgentValue::Integer(n) => integer(*n),
        AgentValue::Counter32(n) => tlv(TAG_COUNTER32, &unsigned(u64::from(*n))),
        AgentValue::Gauge32(n) => tlv(TAG_GAUGE32, &unsigned(u64::from(*n))),
        AgentValue::Counter64(n) => tlv(TAG_COUNTER64, &unsigned(*n)),
        AgentValue::Timeticks(n) => tlv(TAG_TIMETICKS, &unsigned(u64::from(*n))),
        AgentValue::ObjectId(oid) => tlv(TAG_OID, &encode_arcs(&arcs(oid))),
        AgentValue::IpAddress(ip) => tlv(TAG_IP_ADDRESS, ip),
    }
}

pub fn arcs(oid: &str) -> Vec<u32> {
    oid.split('.')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().unwrap())
        .collect()
}

fn encode_arcs(arcs: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    push_base128(arcs[0] * 40 + arcs[1], &mut out);
    for arc in &arcs[2..] {
        push_base128(*arc, &mut out);
    }
    out
}

fn push_base128(mut n: u32, out: &mut Vec<u8>) {
    let mut chunk = vec![(n & 0x7f) as u8];
    n >>= 7;
    while n > 0 {
        chunk.push((n & 0x7f) as u8 | 0x80);
        n >>= 7;
    }
    chunk.reverse();
    out.extend(chunk);
}

fn integer(n: i64) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let (b, next) = (bytes[start], bytes[start + 1]);
        if (b == 0x00 && next & 0x80 == 0) || (b == 0xFF && next & 0x80 != 0) {
            start += 1;
        } else {
            break;
        }
    }
    tlv(TAG_INTEGER, &bytes[start..])
}

fn unsigned(n: u64) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(7);
    let mut out = bytes[first..].to_vec();
    if out[0] & 0x80 != 0 {
        out.insert(0, 0);
    }
    out
}

fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = (len as u32).to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(3);
        out.push(0x80 | (4 - first) as u8);
        out.extend_from_slice(&bytes[first..]);
    }
    out.extend_from_slice(content);
    out
}
