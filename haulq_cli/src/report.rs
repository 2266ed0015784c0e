use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use haulq_optimizer::{
    kpi::kpi_set::KpiSet,
    problem::haul_problem::HaulProblem,
    solver::optimization_outcome::OptimizationOutcome,
};

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn minutes(value: f64) -> String {
    format!("{value:.1}")
}

pub fn offsets_table(outcome: &OptimizationOutcome, problem: &HaulProblem) -> Table {
    let mut table = table(vec!["Contractor", "Trucks", "Baseline", "Best", "Shift"]);

    for ((contractor, baseline), (_, best)) in outcome
        .baseline
        .offsets
        .iter()
        .zip(outcome.best.offsets.iter())
    {
        let contractor = problem.contractor(contractor);
        table.add_row(vec![
            contractor.external_id().to_owned(),
            contractor.truck_count().to_string(),
            format!("{baseline:#}"),
            format!("{best:#}"),
            format!("{:#}", best - baseline),
        ]);
    }

    table
}

pub fn score_table(outcome: &OptimizationOutcome) -> Table {
    let mut table = table(vec!["", "Cost", "Dump wait (min)", "Load wait (min)"]);

    for (label, score) in [
        ("Baseline", &outcome.baseline.score),
        ("Best", &outcome.best.score),
    ] {
        table.add_row(vec![
            label.to_owned(),
            format!("{:.3}", score.cost),
            minutes(score.dump_wait_minutes),
            minutes(score.load_wait_minutes),
        ]);
    }

    table
}

pub fn site_table(kpis: &KpiSet) -> Table {
    let mut table = table(vec![
        "Site",
        "Kind",
        "Arrivals",
        "Avg wait",
        "Max wait",
        "Utilization",
        "Residual queue",
        "Overloaded",
        "Excluded",
        "Rating",
    ]);

    for site in &kpis.sites {
        table.add_row(vec![
            site.external_id.clone(),
            format!("{:?}", site.kind),
            site.arrivals.to_string(),
            minutes(site.avg_wait_minutes),
            minutes(site.max_wait_minutes),
            format!("{:.0}%", site.avg_utilization * 100.0),
            format!("{:.1}", site.residual_queue),
            site.overloaded_buckets.to_string(),
            site.excluded_arrivals.to_string(),
            site.rating.as_str().to_owned(),
        ]);
    }

    table
}

pub fn contractor_table(kpis: &KpiSet) -> Table {
    let mut table = table(vec![
        "Contractor",
        "Trucks",
        "Trips",
        "Dump wait",
        "Load wait",
        "Cycle",
        "Trips/truck",
        "Trips/shift",
        "Utilization",
    ]);

    for contractor in &kpis.contractors {
        table.add_row(vec![
            contractor.external_id.clone(),
            contractor.trucks.to_string(),
            contractor.trips.to_string(),
            minutes(contractor.avg_dump_wait_minutes),
            minutes(contractor.avg_load_wait_minutes),
            minutes(contractor.avg_cycle_minutes),
            format!("{:.2}", contractor.trips_per_truck),
            format!("{:.1}", contractor.trips_per_shift),
            format!("{:.0}%", contractor.utilization * 100.0),
        ]);
    }

    table
}
