use fxhash::FxHashMap;
use jiff::{SignedDuration, Timestamp, tz::TimeZone};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{DataInsufficiencyError, HaulError, ValidationError};

use super::{
    contractor::{Contractor, ContractorIdx},
    haul_cycle_record::HaulCycleRecord,
    horizon::Horizon,
    offset_vector::OffsetVector,
    site::{PeakSchedule, PeakWindow, Site, SiteIdx, SiteKind, servers_from_label},
};

/// Replaces derived parameters of a site referenced by the records.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SiteOverride {
    pub site: String,
    pub servers: Option<usize>,
    pub service_time: Option<SignedDuration>,
    pub peak_windows: Option<Vec<PeakWindow>>,
}

/// A record resolved against the contractors and sites of the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trip {
    pub record: usize,
    pub contractor: ContractorIdx,
    pub load_site: SiteIdx,
    pub dump_site: SiteIdx,
}

pub struct HaulProblem {
    records: Vec<HaulCycleRecord>,
    trips: Vec<Trip>,
    sites: Vec<Site>,
    contractors: Vec<Contractor>,
    horizon: Horizon,
    time_zone: TimeZone,
}

impl HaulProblem {
    pub fn records(&self) -> &[HaulCycleRecord] {
        &self.records
    }

    pub fn record(&self, trip: &Trip) -> &HaulCycleRecord {
        &self.records[trip.record]
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn site(&self, index: SiteIdx) -> &Site {
        &self.sites[index]
    }

    pub fn site_by_id(&self, external_id: &str) -> Option<SiteIdx> {
        self.sites
            .iter()
            .position(|site| site.external_id() == external_id)
            .map(SiteIdx::new)
    }

    pub fn contractors(&self) -> &[Contractor] {
        &self.contractors
    }

    pub fn contractor(&self, index: ContractorIdx) -> &Contractor {
        &self.contractors[index]
    }

    pub fn contractor_by_id(&self, external_id: &str) -> Option<ContractorIdx> {
        self.contractors
            .iter()
            .position(|contractor| contractor.external_id() == external_id)
            .map(ContractorIdx::new)
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }

    /// Trips whose load or dump queue join leaves the horizon at some offset
    /// within their contractor's bounds.
    pub fn trips_leaving_horizon(&self) -> usize {
        self.trips
            .iter()
            .filter(|trip| {
                let record = self.record(trip);
                let bounds = self.contractor(trip.contractor).bounds();
                let segments = record.segments();
                let earliest = record.departure() + bounds.min + segments.until_load_queue();
                let latest = record.departure() + bounds.max + segments.until_dump_queue();
                !self.horizon.contains(earliest) || !self.horizon.contains(latest)
            })
            .count()
    }

    /// The offsets contractors currently run with.
    pub fn baseline_offsets(&self) -> OffsetVector {
        self.contractors
            .iter()
            .map(|contractor| contractor.current_offset())
            .collect()
    }

    /// Baseline offsets with the named contractors moved. Bounds are not
    /// checked here.
    pub fn offsets_with<'a>(
        &self,
        named: impl IntoIterator<Item = (&'a str, SignedDuration)>,
    ) -> Result<OffsetVector, ValidationError> {
        let mut offsets = self.baseline_offsets();
        for (external_id, offset) in named {
            let contractor = self
                .contractor_by_id(external_id)
                .ok_or_else(|| ValidationError::UnknownOffsetContractor(external_id.to_owned()))?;
            offsets.set(contractor, offset);
        }
        Ok(offsets)
    }
}

#[derive(Default)]
pub struct HaulProblemBuilder {
    records: Vec<HaulCycleRecord>,
    contractors: Vec<Contractor>,
    site_overrides: Vec<SiteOverride>,
    horizon: Option<Horizon>,
    time_zone: Option<TimeZone>,
    default_servers: Option<usize>,
}

impl HaulProblemBuilder {
    pub const DEFAULT_SERVERS: usize = 1;

    pub fn set_records(&mut self, records: Vec<HaulCycleRecord>) -> &mut HaulProblemBuilder {
        self.records = records;
        self
    }

    pub fn add_records(
        &mut self,
        records: impl IntoIterator<Item = HaulCycleRecord>,
    ) -> &mut HaulProblemBuilder {
        self.records.extend(records);
        self
    }

    pub fn set_contractors(&mut self, contractors: Vec<Contractor>) -> &mut HaulProblemBuilder {
        self.contractors = contractors;
        self
    }

    pub fn add_contractor(&mut self, contractor: Contractor) -> &mut HaulProblemBuilder {
        self.contractors.push(contractor);
        self
    }

    pub fn set_site_overrides(
        &mut self,
        site_overrides: Vec<SiteOverride>,
    ) -> &mut HaulProblemBuilder {
        self.site_overrides = site_overrides;
        self
    }

    pub fn add_site_override(&mut self, site_override: SiteOverride) -> &mut HaulProblemBuilder {
        self.site_overrides.push(site_override);
        self
    }

    pub fn set_horizon(&mut self, horizon: Horizon) -> &mut HaulProblemBuilder {
        self.horizon = Some(horizon);
        self
    }

    pub fn set_time_zone(&mut self, time_zone: TimeZone) -> &mut HaulProblemBuilder {
        self.time_zone = Some(time_zone);
        self
    }

    /// Servers assumed for sites whose label carries no line range.
    pub fn set_default_servers(&mut self, servers: usize) -> &mut HaulProblemBuilder {
        self.default_servers = Some(servers);
        self
    }

    #[instrument(skip_all, level = "debug")]
    pub fn build(self) -> Result<HaulProblem, HaulError> {
        let contractor_ids = self.index_contractors()?;

        let mut site_ids: FxHashMap<&str, SiteIdx> = FxHashMap::default();
        let mut site_stubs: Vec<SiteStub> = Vec::new();
        let mut trips = Vec::with_capacity(self.records.len());

        for (index, record) in self.records.iter().enumerate() {
            record.validate(index)?;

            let contractor = *contractor_ids.get(record.contractor()).ok_or_else(|| {
                ValidationError::UnknownContractor {
                    record: index,
                    contractor: record.contractor().to_owned(),
                }
            })?;

            let segments = record.segments();
            let load_site = register_site(
                &mut site_ids,
                &mut site_stubs,
                record.loading_origin(),
                SiteKind::Load,
                segments.load_service(),
            )?;
            let dump_site = register_site(
                &mut site_ids,
                &mut site_stubs,
                record.dumping_destination(),
                SiteKind::Dump,
                segments.dump_service(),
            )?;

            trips.push(Trip {
                record: index,
                contractor,
                load_site,
                dump_site,
            });
        }

        for site_override in &self.site_overrides {
            let index = site_ids
                .get(site_override.site.as_str())
                .ok_or_else(|| ValidationError::UnknownSite(site_override.site.clone()))?;
            site_stubs[index.get()].site_override = Some(site_override);
        }

        let default_servers = self.default_servers.unwrap_or(Self::DEFAULT_SERVERS);
        let sites = site_stubs
            .into_iter()
            .map(|stub| stub.into_site(default_servers))
            .collect::<Result<Vec<_>, _>>()?;

        let horizon = match self.horizon {
            Some(horizon) => horizon,
            None => derive_horizon(&self.records, &self.contractors)?,
        };

        debug!(
            records = self.records.len(),
            sites = sites.len(),
            contractors = self.contractors.len(),
            "Built haul problem from {} to {}",
            horizon.start(),
            horizon.end()
        );

        Ok(HaulProblem {
            records: self.records,
            trips,
            sites,
            contractors: self.contractors,
            horizon,
            time_zone: self.time_zone.unwrap_or(TimeZone::UTC),
        })
    }

    fn index_contractors(&self) -> Result<FxHashMap<&str, ContractorIdx>, ValidationError> {
        let mut contractor_ids = FxHashMap::default();
        for (index, contractor) in self.contractors.iter().enumerate() {
            contractor.validate()?;
            if contractor_ids
                .insert(contractor.external_id(), ContractorIdx::new(index))
                .is_some()
            {
                return Err(ValidationError::DuplicateContractor(
                    contractor.external_id().to_owned(),
                ));
            }
        }
        Ok(contractor_ids)
    }
}

struct SiteStub<'a> {
    external_id: &'a str,
    kind: SiteKind,
    observed_service: SignedDuration,
    observations: i32,
    site_override: Option<&'a SiteOverride>,
}

impl SiteStub<'_> {
    fn into_site(self, default_servers: usize) -> Result<Site, HaulError> {
        let site_override = self.site_override;

        let servers = site_override
            .and_then(|site_override| site_override.servers)
            .or_else(|| servers_from_label(self.external_id))
            .unwrap_or(default_servers);

        let service_time = match site_override.and_then(|site_override| site_override.service_time)
        {
            Some(service_time) => service_time,
            None if self.observations > 0 => self.observed_service / self.observations,
            None => {
                return Err(DataInsufficiencyError::NoServiceTime(self.external_id.to_owned()).into());
            }
        };

        let site = Site::new(self.external_id, self.kind, servers, service_time)?;
        match site_override.and_then(|site_override| site_override.peak_windows.clone()) {
            Some(windows) => Ok(site.with_peak_schedule(PeakSchedule::new(windows))?),
            None => Ok(site),
        }
    }
}

fn register_site<'a>(
    site_ids: &mut FxHashMap<&'a str, SiteIdx>,
    site_stubs: &mut Vec<SiteStub<'a>>,
    external_id: &'a str,
    kind: SiteKind,
    service: SignedDuration,
) -> Result<SiteIdx, ValidationError> {
    let index = *site_ids.entry(external_id).or_insert_with(|| {
        site_stubs.push(SiteStub {
            external_id,
            kind,
            observed_service: SignedDuration::ZERO,
            observations: 0,
            site_override: None,
        });
        SiteIdx::new(site_stubs.len() - 1)
    });

    let stub = &mut site_stubs[index.get()];
    if stub.kind != kind {
        return Err(ValidationError::SiteKindConflict(external_id.to_owned()));
    }

    // Zero durations are missing observations, not instant services.
    if service.is_positive() {
        stub.observed_service += service;
        stub.observations += 1;
    }

    Ok(index)
}

/// Spans every recorded cycle, widened by the furthest any contractor may shift.
fn derive_horizon(
    records: &[HaulCycleRecord],
    contractors: &[Contractor],
) -> Result<Horizon, HaulError> {
    let reach = contractors
        .iter()
        .map(|contractor| contractor.bounds().reach())
        .max()
        .unwrap_or(SignedDuration::ZERO);

    let first: Option<Timestamp> = records.iter().map(|record| record.departure()).min();
    let last: Option<Timestamp> = records
        .iter()
        .map(|record| {
            let segments = record.segments();
            let dump_done = segments.until_dump_queue() + segments.dump_service();
            record.departure() + record.cycle_time().max(dump_done)
        })
        .max();

    match (first, last) {
        (Some(first), Some(last)) => Ok(Horizon::new(
            first - reach,
            last + reach + SignedDuration::from_mins(1),
        )?),
        _ => Err(DataInsufficiencyError::NoHorizon.into()),
    }
}
