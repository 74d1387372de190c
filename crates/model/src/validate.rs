//! Structural checks run on a report definition before any layout happens.

use crate::band::{BandRole, Element, ElementKind};
use crate::error::{StructuralViolation, ValidationError};
use crate::report::ReportDefinition;
use log::debug;
use quire_data::Parameters;

/// Collects every nesting violation in the report.
///
/// Root sections must carry the role of the slot they sit in, nested bands
/// may not claim a root-level role, and page bands may not contain
/// sub-reports at any depth.
pub fn structural_violations(report: &ReportDefinition) -> Vec<StructuralViolation> {
    let mut violations = Vec::new();
    for (section, expected, element) in report.sections() {
        match element.as_band() {
            Some(band) if band.role == expected => {
                for child in &band.children {
                    check_nested(child, expected, expected, &mut violations);
                }
            }
            _ => violations.push(StructuralViolation::WrongSectionRole { section, expected }),
        }
    }
    for group in &report.groups {
        if group.fields.is_empty() {
            violations.push(StructuralViolation::GroupWithoutFields(group.name.to_string()));
        }
    }
    violations
}

fn check_nested(
    element: &Element,
    parent: BandRole,
    section: BandRole,
    out: &mut Vec<StructuralViolation>,
) {
    match &element.kind {
        ElementKind::Band(band) => {
            if band.role.is_root_level() {
                out.push(StructuralViolation::NestedRootBand {
                    parent,
                    child: band.role,
                    element: element.id,
                });
            }
            for child in &band.children {
                check_nested(child, band.role, section, out);
            }
        }
        ElementKind::SubReport(sub) => {
            if section.is_page_band() {
                out.push(StructuralViolation::SubReportInPageBand {
                    band: section,
                    element: element.id,
                });
            }
            let inner = [&sub.header, &Some(sub.item_band.clone()), &sub.footer];
            for band in inner.into_iter().flatten() {
                for child in band.children() {
                    check_nested(child, BandRole::Nested, section, out);
                }
            }
        }
        _ => {}
    }
}

/// Full validation of a report against the parameters a caller supplied.
///
/// All problems are reported, not just the first.
pub fn validate(report: &ReportDefinition, parameters: &Parameters) -> Result<(), Vec<ValidationError>> {
    let mut errors: Vec<ValidationError> = structural_violations(report)
        .into_iter()
        .map(ValidationError::from)
        .collect();

    for p in &report.parameters {
        let supplied = parameters.get(&p.name).is_some_and(|v| !v.is_null());
        if p.mandatory && !supplied && p.default.is_none() {
            errors.push(ValidationError::MissingParameter(p.name.clone()));
        }
    }

    if let Some(query) = &report.query {
        match &report.data_factory {
            None => errors.push(ValidationError::NoDataFactory(query.to_string())),
            Some(factory) => {
                if !factory.query_names().iter().any(|n| n == query.as_str()) {
                    errors.push(ValidationError::UnknownQuery(query.to_string()));
                }
            }
        }
    }

    if errors.is_empty() {
        debug!("Report '{}' passed validation", report.name);
        Ok(())
    } else {
        Err(errors)
    }
}
