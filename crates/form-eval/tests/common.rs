use form_core::{Exemplar, ExemplarId, ParamValue, Signal};
use form_eval::ReferenceTable;
use form_testkit::normal_samples;

pub fn exemplar(values: &[(&str, ParamValue)]) -> Exemplar {
    let signal = Signal::new(vec![0.0; 10], 10.0).expect("signal");
    let mut exemplar = Exemplar::new(ExemplarId::from_raw(1), signal);
    for (name, value) in values {
        exemplar.add_parameter(name, value.clone()).expect("fresh parameter");
    }
    exemplar
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Two independent normal columns `a` and `b`.
pub fn gaussian_table(n: usize, mean: f64, seed: u64) -> ReferenceTable {
    let a = normal_samples(n, mean, 1.0, seed);
    let b = normal_samples(n, mean, 1.0, seed.wrapping_add(1));
    let rows = a.into_iter().zip(b).map(|(x, y)| vec![x, y]).collect();
    ReferenceTable::new(names(&["a", "b"]), rows).expect("table")
}
