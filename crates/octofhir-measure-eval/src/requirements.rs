//! `$data-requirements`

use crate::error::{MeasureError, MeasureResult};
use crate::service::MeasureService;
use async_trait::async_trait;
use octofhir_measure_model::{
    CodeableConcept, Coding, DataRequirementsProvider, EngineError, Library, Measure,
    MeasurementPeriod, RelatedArtifact,
};

pub const LIBRARY_TYPE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/library-type";

/// Data requirements derived from the measure's own library references
///
/// Lists every `Measure.library` canonical as a `depends-on` artifact. Used
/// when no clinical-logic aware provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelatedArtifactRequirements;

#[async_trait]
impl DataRequirementsProvider for RelatedArtifactRequirements {
    async fn data_requirements(
        &self,
        measure: &Measure,
        _period: Option<&MeasurementPeriod>,
    ) -> Result<Library, EngineError> {
        Ok(Library {
            name: measure.name.clone(),
            status: "active".into(),
            library_type: CodeableConcept::from_coding(Coding::new(
                LIBRARY_TYPE_SYSTEM,
                "module-definition",
            )),
            related_artifact: measure
                .library
                .iter()
                .map(|canonical| RelatedArtifact::depends_on(canonical.clone()))
                .collect(),
            ..Default::default()
        })
    }
}

impl MeasureService {
    /// Data requirements of a measure, optionally for a period
    ///
    /// A period needs both bounds; one bound alone is rejected.
    pub async fn data_requirements(
        &self,
        measure_id: &str,
        period_start: Option<&str>,
        period_end: Option<&str>,
    ) -> MeasureResult<Library> {
        let measure = self.read_measure(measure_id).await?;
        let period = match (period_start, period_end) {
            (Some(start), Some(end)) => Some(MeasurementPeriod::parse(start, end)?),
            (None, None) => None,
            _ => {
                return Err(MeasureError::InvalidPeriod {
                    message: "periodStart and periodEnd must be given together".into(),
                });
            }
        };

        Ok(self
            .requirements
            .data_requirements(&measure, period.as_ref())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_library_canonicals_become_depends_on() {
        let measure = Measure {
            id: Some("m1".into()),
            library: vec![
                "http://example.org/Library/Common".into(),
                "http://example.org/Library/Diabetes".into(),
            ],
            ..Default::default()
        };

        let library = RelatedArtifactRequirements
            .data_requirements(&measure, None)
            .await
            .unwrap();
        assert_eq!(library.library_type.first_code(), Some("module-definition"));
        assert_eq!(library.related_artifact.len(), 2);
        assert!(library.related_artifact.iter().all(RelatedArtifact::is_depends_on));
        assert_eq!(
            library.related_artifact[1].resource.as_deref(),
            Some("http://example.org/Library/Diabetes")
        );
    }
}
