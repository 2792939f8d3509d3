use anyhow::Result;
use snmp2::AsyncSession;

/// Opens a USM session using the shared credential as user name (noAuthNoPriv).
#[cfg(feature = "v3")]
pub async fn open_session(target: &str, credential: &[u8]) -> Result<AsyncSession> {
    use anyhow::Context;
    use snmp2::v3::{Auth, Security};

    let security = Security::new(credential, b"").with_auth(Auth::NoAuthNoPriv);
    let mut session = AsyncSession::new_v3(target, 0, security)
        .await
        .context("cannot create SNMPv3 session")?;
    session
        .init()
        .await
        .map_err(|e| anyhow::anyhow!("SNMPv3 engine discovery failed: {}", e))?;
    Ok(session)
}

#[cfg(not(feature = "v3"))]
pub async fn open_session(target: &str, _credential: &[u8]) -> Result<AsyncSession> {
    anyhow::bail!(
        "SNMPv3 support is not compiled in (enable the `v3` feature) for {}",
        target
    )
}
