use std::{env, net::SocketAddr, time::Duration};

use anyhow::{Context, Result};

/// Variable de entorno para fijar la dirección del coordinador a mano.
pub const COORDINATOR_ADDR_ENV: &str = "MR_COORDINATOR_ADDR";

/// Base del rango de puertos por usuario (35840..45839).
pub const BASE_PORT: u16 = 35840;
const PORT_SPAN: u32 = 10_000;

pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_WAIT_BACKOFF: Duration = Duration::from_secs(1);
pub const COMPLETION_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Puerto derivado del uid: un coordinador por usuario, sin configuración.
pub fn port_for_uid(uid: u32) -> u16 {
    BASE_PORT + (uid % PORT_SPAN) as u16
}

fn current_uid() -> u32 {
    nix::unistd::getuid().as_raw()
}

/// Dirección local del coordinador.
/// - Si `MR_COORDINATOR_ADDR` está definida, se usa tal cual.
/// - Si no, `127.0.0.1:<puerto del usuario>`.
pub fn coordinator_addr() -> Result<SocketAddr> {
    match env::var(COORDINATOR_ADDR_ENV) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{COORDINATOR_ADDR_ENV} inválida: {raw}")),
        Err(_) => Ok(SocketAddr::from(([127, 0, 0, 1], port_for_uid(current_uid())))),
    }
}

/// URL base HTTP para hablar con el coordinador.
pub fn coordinator_base_url() -> Result<String> {
    Ok(base_url_for(coordinator_addr()?))
}

pub fn base_url_for(addr: SocketAddr) -> String {
    format!("http://{addr}")
}
