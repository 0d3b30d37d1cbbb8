use crate::client::{ResilientClient, Transport};
use crate::motors::{MotorsDirection, MotorsStatus};
use crate::GatewayError;
use clock::Clock;
use log::*;
use serde::Deserialize;
use spot::{Frame, Rectangle};

/// Camera and motors of the rig, as seen by the supervisor.
///
/// Every call blocks until it has an answer or the gateway gave up.
pub trait Gateway {
    /// Full frame, converted to 8 bit grayscale
    fn capture(&mut self) -> Result<Frame, GatewayError>;

    /// Only the pixels of `area`, as an `area.width() x area.height()` frame
    fn capture_area(&mut self, area: &Rectangle) -> Result<Frame, GatewayError>;

    /// One discrete step. `panel` selects the panel on multi-panel rigs.
    fn move_one_step(
        &mut self,
        direction: MotorsDirection,
        panel: Option<usize>,
    ) -> Result<(), GatewayError>;

    fn stop(&mut self) -> Result<(), GatewayError>;

    fn motors_status(&mut self) -> Result<MotorsStatus, GatewayError>;
}

impl<G: Gateway + ?Sized> Gateway for Box<G> {
    fn capture(&mut self) -> Result<Frame, GatewayError> {
        (**self).capture()
    }

    fn capture_area(&mut self, area: &Rectangle) -> Result<Frame, GatewayError> {
        (**self).capture_area(area)
    }

    fn move_one_step(
        &mut self,
        direction: MotorsDirection,
        panel: Option<usize>,
    ) -> Result<(), GatewayError> {
        (**self).move_one_step(direction, panel)
    }

    fn stop(&mut self) -> Result<(), GatewayError> {
        (**self).stop()
    }

    fn motors_status(&mut self) -> Result<MotorsStatus, GatewayError> {
        (**self).motors_status()
    }
}

#[derive(Deserialize)]
struct MotorsStatusPayload {
    #[serde(rename = "motors-state")]
    motors_state: String,
}

/// Gateway reached over HTTP through the retrying client.
pub struct HttpGateway<T: Transport, C: Clock> {
    client: ResilientClient<T, C>,
}

impl<T: Transport, C: Clock> HttpGateway<T, C> {
    pub fn new(client: ResilientClient<T, C>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ResilientClient<T, C> {
        &self.client
    }

    fn motors_command(&self, cmd: &str, panel: Option<usize>) -> Result<(), GatewayError> {
        let mut path = format!("/motors_command?cmd={}&continuous=0", cmd);
        if let Some(panel) = panel {
            path.push_str(&format!("&panel={}", panel));
        }
        self.client.get(&path)?;
        Ok(())
    }
}

impl<T: Transport, C: Clock> Gateway for HttpGateway<T, C> {
    fn capture(&mut self) -> Result<Frame, GatewayError> {
        let path = "/capture";
        let body = self.client.get(path)?;
        let image = image::load_from_memory(&body).map_err(|e| GatewayError::InvalidPayload {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let frame = image.to_luma8();
        debug!("Captured {}x{} frame", frame.width(), frame.height());
        Ok(frame)
    }

    fn capture_area(&mut self, area: &Rectangle) -> Result<Frame, GatewayError> {
        let path = format!(
            "/capture_area?left_px={}&top_px={}&right_px={}&bottom_px={}",
            area.left, area.top, area.right, area.bottom
        );
        let body = self.client.get(&path)?;
        let expected = area.width() as usize * area.height() as usize;
        if body.len() != expected {
            return Err(GatewayError::InvalidPayload {
                path,
                reason: format!("expected {} bytes, got {}", expected, body.len()),
            });
        }
        Frame::from_raw(area.width(), area.height(), body).ok_or_else(|| {
            GatewayError::InvalidPayload {
                path,
                reason: "buffer does not match the area".to_string(),
            }
        })
    }

    fn move_one_step(
        &mut self,
        direction: MotorsDirection,
        panel: Option<usize>,
    ) -> Result<(), GatewayError> {
        info!("Motors command {}", direction);
        self.motors_command(direction.as_command(), panel)
    }

    fn stop(&mut self) -> Result<(), GatewayError> {
        info!("Motors command stop");
        self.motors_command(MotorsDirection::Stop.as_command(), None)
    }

    fn motors_status(&mut self) -> Result<MotorsStatus, GatewayError> {
        let path = "/motors_status";
        let body = self.client.get(path)?;
        let payload: MotorsStatusPayload =
            serde_json::from_slice(&body).map_err(|e| GatewayError::InvalidPayload {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        payload.motors_state.parse()
    }
}
