use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use snmp2::{AsyncSession, Oid, Value};
use tokio::sync::Mutex;
use tokio::time::{Duration, timeout};
use tracing::debug;

use super::oid::parse_oid;
use super::session::{DeviceConnector, DeviceSession, ProtocolVersion, ScalarValue, SessionParams};

const BULK_REPETITIONS: u32 = 10;

/// Opens snmp2-backed sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct Snmp2Connector;

#[async_trait]
impl DeviceConnector for Snmp2Connector {
    async fn connect(&self, params: &SessionParams) -> Result<Box<dyn DeviceSession>> {
        let client = SnmpClient::connect(params).await?;
        Ok(Box::new(client))
    }
}

/// One UDP session to a device.
///
/// `AsyncSession` needs `&mut self` per exchange, so concurrent callers are
/// serialized through the mutex: at most one request is on the wire per session.
pub struct SnmpClient {
    session: Mutex<AsyncSession>,
    version: ProtocolVersion,
    timeout: Duration,
    retries: u32,
}

impl SnmpClient {
    pub async fn connect(params: &SessionParams) -> Result<Self> {
        let target = params.address();
        let community = params.credential.as_bytes();

        let open = async {
            match params.version {
                ProtocolVersion::V1 => AsyncSession::new_v1(target.as_str(), community, 0)
                    .await
                    .map_err(anyhow::Error::from),
                ProtocolVersion::V2c => AsyncSession::new_v2c(target.as_str(), community, 0)
                    .await
                    .map_err(anyhow::Error::from),
                ProtocolVersion::V3 => super::v3::open_session(&target, community).await,
            }
        };

        let session = timeout(params.timeout, open)
            .await
            .map_err(|_| anyhow!("timed out opening session to {}", target))?
            .with_context(|| format!("cannot open {} session to {}", params.version, target))?;

        debug!(target = %target, version = %params.version, "SNMP session opened");

        Ok(Self {
            session: Mutex::new(session),
            version: params.version,
            timeout: params.timeout,
            retries: params.retries,
        })
    }

    /// One GET carrying every OID of the batch, bounded by timeout and retries.
    ///
    /// Values come back in request order; a response with a different varbind
    /// count or a non-zero error status fails the whole batch.
    async fn get_batch(
        &self,
        session: &mut AsyncSession,
        oids: &[Oid<'static>],
    ) -> Result<Vec<ScalarValue>> {
        let refs: Vec<&Oid<'_>> = oids.iter().collect();
        let mut attempt = 0;
        loop {
            let exchange = async {
                let resp = session.get_many(&refs).await?;
                let values = resp
                    .varbinds
                    .map(|(_, value)| ScalarValue::from(value))
                    .collect::<Vec<_>>();
                Ok::<_, snmp2::Error>((resp.error_status, resp.error_index, values))
            };
            match timeout(self.timeout, exchange).await {
                Ok(Ok((0, _, values))) => {
                    if values.len() != oids.len() {
                        bail!(
                            "agent returned {} varbind(s) for {} requested OID(s)",
                            values.len(),
                            oids.len()
                        );
                    }
                    return Ok(values);
                }
                Ok(Ok((status, index, _))) => {
                    bail!("agent answered error status {} at varbind {}", status, index)
                }
                Ok(Err(e)) if attempt >= self.retries => {
                    bail!("SNMP GET of {} OID(s) failed: {}", oids.len(), e)
                }
                Err(_) if attempt >= self.retries => {
                    bail!("SNMP GET timed out after {} attempt(s)", attempt + 1)
                }
                _ => attempt += 1,
            }
        }
    }

    /// One GETBULK (or GETNEXT for v1) step past `from`, bounded by timeout and retries.
    async fn next_rows(
        &self,
        session: &mut AsyncSession,
        from: &Oid<'_>,
    ) -> Result<Vec<(Oid<'static>, ScalarValue)>> {
        let mut attempt = 0;
        loop {
            let step = async {
                let resp = match self.version {
                    ProtocolVersion::V1 => session.getnext(from).await,
                    _ => session.getbulk(&[from], 0, BULK_REPETITIONS).await,
                }?;
                Ok::<_, snmp2::Error>(
                    resp.varbinds
                        .map(|(oid, value)| (oid.to_owned(), ScalarValue::from(value)))
                        .collect::<Vec<_>>(),
                )
            };
            match timeout(self.timeout, step).await {
                Ok(Ok(rows)) => return Ok(rows),
                Ok(Err(e)) if attempt >= self.retries => bail!("SNMP walk step failed: {}", e),
                Err(_) if attempt >= self.retries => bail!("SNMP walk step timed out"),
                _ => attempt += 1,
            }
        }
    }
}

#[async_trait]
impl DeviceSession for SnmpClient {
    async fn get(&self, oids: &[String]) -> Result<Vec<ScalarValue>> {
        let parsed = oids
            .iter()
            .map(|s| parse_oid(s))
            .collect::<Result<Vec<_>>>()?;

        if parsed.is_empty() {
            return Ok(Vec::new());
        }

        let mut session = self.session.lock().await;
        self.get_batch(&mut session, &parsed).await
    }

    async fn walk(&self, root: &str) -> Result<Vec<(String, ScalarValue)>> {
        let root_oid = parse_oid(root)?;
        let mut session = self.session.lock().await;

        let mut results: Vec<(String, ScalarValue)> = Vec::new();
        let mut current = root_oid.to_owned();

        loop {
            let rows = self.next_rows(&mut session, &current).await?;
            let mut advanced = false;

            for (oid, value) in rows {
                if !oid.starts_with(&root_oid) || value.is_absent() {
                    return Ok(results);
                }
                let name = oid.to_string();
                // an agent repeating the last row would loop forever
                if results.last().is_some_and(|(last, _)| *last == name) {
                    return Ok(results);
                }
                results.push((name, value));
                current = oid;
                advanced = true;
            }

            if !advanced {
                return Ok(results);
            }
        }
    }
}

impl From<Value<'_>> for ScalarValue {
    fn from(value: Value<'_>) -> Self {
        match value {
            Value::OctetString(bytes) | Value::Opaque(bytes) => ScalarValue::Text(bytes.to_vec()),
            Value::Integer(n) => ScalarValue::Integer(n),
            Value::Counter32(n) | Value::Unsigned32(n) => ScalarValue::Unsigned(u64::from(n)),
            Value::Counter64(n) => ScalarValue::Unsigned(n),
            Value::Timeticks(t) => ScalarValue::Timeticks(t),
            Value::ObjectIdentifier(oid) => ScalarValue::ObjectId(oid.to_string()),
            Value::IpAddress(ip) => ScalarValue::IpAddress(ip),
            Value::Boolean(b) => ScalarValue::Boolean(b),
            Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
                ScalarValue::Absent
            }
            other => ScalarValue::Other(format!("{:?}", other)),
        }
    }
}
