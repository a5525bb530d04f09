use sv_results::*;

const EXAMPLE: &str = r##"{
    "#A": [[0, 10, 1, 2], [1, 12, 1.5, 2.5]],
    "%A": [[0, 0.5, 0.05, 0.1], [1, 0.6, 0.07, 0.12]]
}"##;

#[test]
fn example_trace_normalizes() {
    let trace = SimulationTraceResult::from_json_str(EXAMPLE).unwrap();
    assert_eq!(trace.len(), 2);

    let quantities: Vec<String> = trace
        .of_kind(MeasureKind::Quantity)
        .map(|(k, _)| k.to_string())
        .collect();
    assert_eq!(quantities, vec!["#A"]);

    let a = trace.get(&MeasureKey::new(MeasureKind::Quantity, "A")).unwrap();
    assert_eq!(a.first(), Some(&Sample::new(0.0, 10.0, 1.0, 2.0)));
    assert_eq!(trace.time_range(), Some((0.0, 1.0)));
}

#[test]
fn malformed_rows_fail_before_plotting() {
    let err = SimulationTraceResult::from_json_str(r##"{"#A": [[0, 10, 1]]}"##).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("#A"), "{msg}");
    assert!(msg.contains("row 0"), "{msg}");
}

fn attach_twice<T: Profiled>(mut value: T) -> T {
    value.set_profiler_reading(ProfilerReading::new(0.5, 1.0));
    value.set_profiler_reading(ProfilerReading::new(2.0, 3.0));
    value
}

#[test]
fn every_wrapper_exposes_profiler_slot() {
    let trace = attach_twice(SimulationTraceResult::from_json_str(EXAMPLE).unwrap());
    assert_eq!(trace.profiler_reading().unwrap().time_elapsed, 2.0);

    let fpt = attach_twice(FirstPassageTimeResult::from_source(
        &FirstPassageTimePayload::default(),
    ));
    assert_eq!(fpt.profiler_reading().unwrap().memory_used, 3.0);

    let reach = attach_twice(ReachabilityResult::new(0.5, ReachabilityQuery::new("g")).unwrap());
    assert!(reach.profiler_reading().is_some());

    // the reading never leaks into dict views
    assert!(fpt.to_dict().get("reading").is_none());
    assert!(reach.to_dict().get("reading").is_none());
}

struct EngineFpt;

impl FirstPassageTimeSource for EngineFpt {
    fn tests(&self) -> u64 {
        10
    }
    fn hits(&self) -> u64 {
        4
    }
    fn mean(&self) -> f64 {
        2.5
    }
    fn standard_deviation(&self) -> f64 {
        0.5
    }
    fn min(&self) -> f64 {
        1.0
    }
    fn q1(&self) -> f64 {
        2.0
    }
    fn q2(&self) -> f64 {
        2.5
    }
    fn q3(&self) -> f64 {
        3.0
    }
    fn max(&self) -> f64 {
        4.0
    }
}

#[test]
fn fpt_reads_any_engine_object() {
    let r = FirstPassageTimeResult::from_source(&EngineFpt);
    assert_eq!(r.hits(), Some(4));
    assert_eq!(r.summary().unwrap().q2, 2.5);
    assert_eq!(r.to_string().lines().count(), 9);
}
