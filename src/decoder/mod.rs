pub mod error;
pub mod frame;
pub mod units;

use log::{debug, trace};

use crate::models::SensorReading;

pub use error::MalformedFrame;
pub use frame::Frame;

/// Decode one W820 notification into `reading`
///
/// The frame is parsed completely before anything is written, so a malformed
/// payload leaves `reading` untouched.
///
/// # Arguments
/// * `data` - Raw notification payload
/// * `reading` - Accumulator shared by all frames of one station session
///
/// # Returns
/// The decoded frame, or `MalformedFrame` if the payload was rejected
pub fn decode_frame(data: &[u8], reading: &mut SensorReading) -> Result<Frame, MalformedFrame> {
    trace!("Raw frame: {}", hex(data));

    let frame = Frame::parse(data)?;
    frame.apply(reading);

    debug!("Decoded frame type {}: {:?}", frame.frame_type(), frame);
    Ok(frame)
}

fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
