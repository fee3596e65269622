// Interpolation and reduction properties over a realistic measured table

use autoacc_rs::config::{parse_table_config, Row};
use autoacc_rs::gcode::parser::Move;
use autoacc_rs::gcode::reduce_velocity;
use autoacc_rs::{AccelLimits, AccelerationTable};

const MEASURED: &str = "\
#*# Factor in %: 100
#*# Axis: X
#*# 50, 9000
#*# 120, 7200
#*# 250, 5100
#*# 400, 3900
#*# End of Axis: X
#*# Axis: Y
#*# 50, 8000
#*# 120, 6500
#*# 250, 4700
#*# 400, 3100
#*# End of Axis: Y
";

fn measured_table() -> AccelerationTable {
    AccelerationTable::from_config(&parse_table_config(MEASURED).unwrap()).unwrap()
}

fn velocities(from: f64, to: f64, step: f64) -> impl Iterator<Item = f64> {
    (0..)
        .map(move |i| from + step * i as f64)
        .take_while(move |v| *v <= to)
}

#[test]
fn test_exact_at_every_sample() {
    let table = measured_table();
    for sample in table.samples() {
        assert_eq!(table.interpolate(sample.velocity), sample.limits());
    }
}

#[test]
fn test_clamped_outside_measured_range() {
    let table = measured_table();
    let low = table.interpolate(50.0);
    let high = table.interpolate(400.0);
    for v in [0.0, 10.0, 49.999] {
        assert_eq!(table.interpolate(v), low);
    }
    for v in [400.001, 800.0, 1e6] {
        assert_eq!(table.interpolate(v), high);
    }
}

#[test]
fn test_between_samples_lies_on_segment() {
    let table = measured_table();
    for pair in table.samples().windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        for v in velocities(lo.velocity, hi.velocity, 0.75) {
            let t = (v - lo.velocity) / (hi.velocity - lo.velocity);
            let limits = table.interpolate(v);
            let expected_x = f64::from(lo.accel_x) + t * (f64::from(hi.accel_x) - f64::from(lo.accel_x));
            let expected_y = f64::from(lo.accel_y) + t * (f64::from(hi.accel_y) - f64::from(lo.accel_y));
            assert!((f64::from(limits.x) - expected_x).abs() <= 1.0, "x at {v}");
            assert!((f64::from(limits.y) - expected_y).abs() <= 1.0, "y at {v}");
        }
    }
}

#[test]
fn test_reduction_visits_table_velocities_and_terminates() {
    let table = measured_table();
    for v in velocities(0.0, 1000.0, 7.5) {
        let mv = Move {
            feed_mm_per_min: v * 60.0,
            x_distance: Some(0.5),
            y_distance: Some(-3.0),
            feed_span: 0..0,
        };
        let reduction = reduce_velocity(&table, &mv).unwrap();
        assert!(reduction.velocity <= v);
        assert!(reduction.steps <= table.samples().len());
        if reduction.steps > 0 {
            assert!(table.samples().iter().any(|s| s.velocity == reduction.velocity));
        }
    }
}

#[test]
fn test_per_axis_interpolation_at_feed_90000() {
    let table = AccelerationTable::build(&[
        Row::AxisX { velocity: 1000.0, accel: 2000 },
        Row::AxisY { velocity: 1000.0, accel: 1500 },
        Row::AxisX { velocity: 2000.0, accel: 3000 },
        Row::AxisY { velocity: 2000.0, accel: 2500 },
    ])
    .unwrap();
    assert_eq!(table.interpolate(90000.0 / 60.0), AccelLimits { x: 2500, y: 2000 });
}
