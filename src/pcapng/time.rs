/// Default value of `if_tsresol`: microseconds
pub const DEFAULT_TSRESOL: u8 = 6;

/// Compute the timestamp resolution, in units per second
///
/// Return the resolution, or `None` if the resolution is invalid (for ex. greater than `2^64`)
pub fn build_ts_resolution(ts_resol: u8) -> Option<u64> {
    let ts_mode = ts_resol & 0x80;
    let exponent = u32::from(ts_resol & 0x7f);
    let unit = if ts_mode == 0 {
        // 10^if_tsresol
        // check that if_tsresol <= 19 (10^19 is the largest power of 10 to fit in a u64)
        if exponent > 19 {
            return None;
        }
        10u64.pow(exponent)
    } else {
        // 2^if_tsresol
        if exponent > 63 {
            return None;
        }
        1 << exponent
    };
    Some(unit)
}

/// Duration of one timestamp unit, in seconds
///
/// Unlike [`build_ts_resolution`], this never fails: very small units are
/// represented with the precision of a `f64`.
pub fn ts_resolution_secs(ts_resol: u8) -> f64 {
    let exponent = i32::from(ts_resol & 0x7f);
    if ts_resol & 0x80 == 0 {
        1.0 / 10f64.powi(exponent)
    } else {
        1.0 / 2f64.powi(exponent)
    }
}

/// Given the timestamp parameters, return the timestamp seconds and fractional part (in resolution
/// units)
pub fn build_ts(ts_high: u32, ts_low: u32, ts_offset: u64, resolution: u64) -> (u32, u32) {
    let ts: u64 = ((ts_high as u64) << 32) | (ts_low as u64);
    let ts_sec = (ts_offset + (ts / resolution)) as u32;
    let ts_fractional = (ts % resolution) as u32;
    (ts_sec, ts_fractional)
}

/// Given the timestamp parameters, return the timestamp as a `f64` value.
///
/// The resolution is given in units per second. In pcap-ng files, it is stored in the
/// Interface Description Block, and can be obtained using [`crate::InterfaceDescriptionBlock::ts_resolution`]
pub fn build_ts_f64(ts_high: u32, ts_low: u32, ts_offset: u64, resolution: u64) -> f64 {
    let (ts_sec, ts_fractional) = build_ts(ts_high, ts_low, ts_offset, resolution);
    // XXX should we round to closest unit?
    ts_sec as f64 + ((ts_fractional as f64) / (resolution as f64))
}
