//! Console rendering of snapshots and node events, as text or JSON lines.

use serde_json::{Value, json};
use vitals_core::vitals::Spo2Status;
use vitals_core::{Field, NodeEvent, SensorSnapshot};

fn valid<T: Into<Value>>(s: &SensorSnapshot, f: Field, v: T) -> Value {
    if s.is_valid(f) { v.into() } else { Value::Null }
}

pub fn snapshot_json(s: &SensorSnapshot) -> Value {
    let location = if s.is_valid(Field::Location) {
        json!({ "major": s.location.major, "minor": s.location.minor, "rssi": s.location.rssi })
    } else {
        Value::Null
    };
    json!({
        "type": "snapshot",
        "timestamp_ms": s.timestamp_ms,
        "generation": s.generation,
        "temperature_c": valid(s, Field::Temperature, s.temperature_c),
        "humidity_pct": valid(s, Field::Humidity, s.humidity_pct),
        "heart_rate_bpm": valid(s, Field::HeartRate, s.heart_rate_bpm),
        "spo2_pct": valid(s, Field::Spo2, s.spo2_pct),
        "spo2_status": valid(s, Field::Spo2, Spo2Status::classify(s.spo2_pct).label()),
        "steps": valid(s, Field::Steps, s.steps),
        "fall_detected": valid(s, Field::Fall, s.fall_detected),
        "location": location,
        "tvoc_ppb": valid(s, Field::AirQuality, s.air.tvoc_ppb),
        "gas_resistance_kohm": valid(s, Field::AirQuality, s.air.resistance_kohm),
        "gas_ratio": valid(s, Field::AirQuality, s.air.ratio),
        "lux": valid(s, Field::Light, s.lux),
    })
}

pub fn snapshot_text(s: &SensorSnapshot) -> String {
    fn or_dash(ok: bool, v: String) -> String {
        if ok { v } else { "--".to_string() }
    }
    format!(
        "t={}ms steps={} hr={} spo2={} temp={} hum={} tvoc={} lux={} fall={} loc={}",
        s.timestamp_ms,
        or_dash(s.is_valid(Field::Steps), s.steps.to_string()),
        or_dash(
            s.is_valid(Field::HeartRate),
            format!("{:.1}", s.heart_rate_bpm)
        ),
        or_dash(
            s.is_valid(Field::Spo2),
            format!(
                "{}% ({})",
                s.spo2_pct,
                Spo2Status::classify(s.spo2_pct).label()
            )
        ),
        or_dash(
            s.is_valid(Field::Temperature),
            format!("{:.1}C", s.temperature_c)
        ),
        or_dash(s.is_valid(Field::Humidity), format!("{:.0}%", s.humidity_pct)),
        or_dash(
            s.is_valid(Field::AirQuality),
            format!("{:.0}ppb", s.air.tvoc_ppb)
        ),
        or_dash(s.is_valid(Field::Light), format!("{:.0}", s.lux)),
        if s.fall_detected { "YES" } else { "no" },
        or_dash(
            s.is_valid(Field::Location),
            format!("{}/{}", s.location.major, s.location.minor)
        ),
    )
}

pub fn event_json(ev: &NodeEvent) -> Value {
    match ev {
        NodeEvent::Step { total, t_ms } => json!({ "type": "step", "total": total, "t_ms": t_ms }),
        NodeEvent::Fall { result, t_ms } => json!({
            "type": "fall",
            "t_ms": t_ms,
            "direction": result.direction.label(),
            "angle_deg": result.fall_angle_deg,
            "total_g": result.total_g,
        }),
        NodeEvent::FallCleared { t_ms } => json!({ "type": "fall_cleared", "t_ms": t_ms }),
    }
}

pub fn event_text(ev: &NodeEvent) -> String {
    match ev {
        NodeEvent::Step { total, t_ms } => format!("[{t_ms}ms] step #{total}"),
        NodeEvent::Fall { result, t_ms } => format!(
            "[{t_ms}ms] FALL {} ({:.0} deg, {:.1} g)",
            result.direction.label(),
            result.fall_angle_deg,
            result.total_g
        ),
        NodeEvent::FallCleared { t_ms } => format!("[{t_ms}ms] fall alert cleared"),
    }
}

pub fn print_snapshot(s: &SensorSnapshot, json: bool) {
    if json {
        println!("{}", snapshot_json(s));
    } else {
        println!("{}", snapshot_text(s));
    }
}

pub fn print_event(ev: &NodeEvent, json: bool) {
    if json {
        println!("{}", event_json(ev));
    } else {
        println!("{}", event_text(ev));
    }
}
