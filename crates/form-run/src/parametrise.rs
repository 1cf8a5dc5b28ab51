//! Post-fit mode: parameters and verdicts for externally placed points.

use form_core::errors::FormError;
use form_core::{Exemplar, Form};
use form_puzzle::{RunnableHc, RunnablePc, StrategyRegistry};
use form_schema::Schema;

use crate::step::{bind_hc, bind_pc};

/// Every PC in dependency order and every HC of a form.
#[derive(Debug)]
pub struct Parametriser {
    pcs: Vec<RunnablePc>,
    hcs: Vec<RunnableHc>,
}

impl Parametriser {
    /// Compiles the form's schema and binds its PCs and HCs.
    pub fn new(form: &Form, registry: &StrategyRegistry) -> Result<Self, FormError> {
        let schema = Schema::compile(form)?;
        let pcs = schema
            .pc_order()
            .into_iter()
            .map(|id| bind_pc(form, registry, id))
            .collect::<Result<Vec<_>, _>>()?;
        let hcs = schema
            .hc_order()
            .into_iter()
            .map(|id| bind_hc(form, registry, id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pcs, hcs })
    }

    /// Adds every PC output and records every HC verdict.
    ///
    /// Works on a copy: on error `exemplar` is left untouched. Returns
    /// whether all HCs passed.
    pub fn parametrise(&self, exemplar: &mut Exemplar) -> Result<bool, FormError> {
        let mut work = exemplar.clone();
        for pc in &self.pcs {
            for (name, value) in pc.run(&work)?.into_result()? {
                work.set_parameter(&name, value, pc.binding().overwrite)?;
            }
        }
        for hc in &self.hcs {
            let passed = hc.run(&work)?.into_result()?;
            work.record_hc(hc.binding().puzzle_id, passed)?;
        }
        let passed = work.all_hcs_passed();
        *exemplar = work;
        Ok(passed)
    }
}
