use tierline_shared::Hold;

use crate::tables::{WorkflowRule, WorkflowTrigger};

pub const INTERNATIONAL_HOLD_CODE: &str = "HOLD_INTL_FORWARDER_REQUIRED";

/// International programs must ship through a freight forwarder
pub fn international_hold(program_id: &str, ship_to_type: Option<&str>) -> Option<Hold> {
    let via_forwarder = ship_to_type.is_some_and(|t| t.trim().eq_ignore_ascii_case("FORWARDER"));
    if !program_id.to_uppercase().contains("INTERNATIONAL") || via_forwarder {
        return None;
    }
    Some(Hold {
        code: INTERNATIONAL_HOLD_CODE.to_string(),
        message: "International orders must ship to a freight forwarder".to_string(),
        mandatory: true,
    })
}

/// Holds raised by workflow rows scoped to the program or `ALL`, in table order
pub fn workflow_holds(rows: &[WorkflowRule], program_id: &str, ship_method: Option<&str>) -> Vec<Hold> {
    rows.iter()
        .filter(|r| r.applies_to(program_id))
        .filter(|r| match &r.trigger {
            WorkflowTrigger::Always => true,
            WorkflowTrigger::ShipMethod(method) => ship_method == Some(method.as_str()),
        })
        .map(|r| Hold {
            code: r.hold_code.clone(),
            message: r.message.clone(),
            mandatory: false,
        })
        .collect()
}
