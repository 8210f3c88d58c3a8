//! `$refresh-generated-content` and `$get-narrative`

use crate::error::MeasureResult;
use crate::service::MeasureService;
use octofhir_measure_model::{Measure, Parameters, Resource};

impl MeasureService {
    /// Rebuild a measure's dependency artifacts and narrative, then store it
    ///
    /// Existing `depends-on` artifacts are replaced by the ones the data
    /// requirements report. Narrative generation is best-effort: a failure is
    /// logged and the measure keeps its previous text.
    pub async fn refresh_generated_content(&self, measure_id: &str) -> MeasureResult<Measure> {
        let mut measure = self.read_measure(measure_id).await?;

        measure.related_artifact.retain(|artifact| !artifact.is_depends_on());

        let requirements = self.requirements.data_requirements(&measure, None).await?;
        for artifact in requirements.related_artifact {
            if !measure.related_artifact.contains(&artifact) {
                measure.related_artifact.push(artifact);
            }
        }

        match self.narrative.narrative(&measure) {
            Ok(narrative) => measure.text = Some(narrative),
            Err(err) => log::warn!("Error generating narrative for Measure/{}: {}", measure_id, err),
        }

        let stored = self.store.update(Resource::from_typed(&measure)?).await?;
        log::info!("Refreshed generated content of Measure/{}", measure_id);
        Ok(stored.to_typed()?)
    }

    /// The generated narrative XHTML as a single string parameter
    pub async fn get_narrative(&self, measure_id: &str) -> MeasureResult<Parameters> {
        let measure = self.read_measure(measure_id).await?;
        let narrative = self.narrative.narrative(&measure)?;

        let mut parameters = Parameters::new();
        parameters.add_string("narrative", narrative.div);
        Ok(parameters)
    }
}
