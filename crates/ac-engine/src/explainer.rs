use std::panic::{self, AssertUnwindSafe};

use ac_types::{Attributor, ExplanationOutcome, FeatureMatrix, FittedModel};
use tracing::{info, warn};

/// Unwraps the fitted model to its base estimator and asks the attribution
/// capability to explain it. Never fails: every problem becomes
/// [`ExplanationOutcome::Unavailable`].
pub struct Explainer<'a> {
    attributor: &'a dyn Attributor,
}

impl<'a> Explainer<'a> {
    pub fn new(attributor: &'a dyn Attributor) -> Self {
        Self { attributor }
    }

    pub fn explain(
        &self,
        model: &FittedModel,
        background: &FeatureMatrix,
        rows: &FeatureMatrix,
    ) -> ExplanationOutcome {
        let estimator = model.estimator();
        if !estimator.capabilities().supports_fit_and_predict() {
            return unavailable(format!(
                "{} does not support both fit and predict",
                estimator.name()
            ));
        }

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            self.attributor.explain(estimator, background, rows)
        }));

        match attempt {
            Ok(Ok(explanation)) => {
                info!(
                    "{} explained {} rows of {}",
                    self.attributor.name(),
                    explanation.n_rows(),
                    estimator.name()
                );
                ExplanationOutcome::Available(explanation)
            }
            Ok(Err(e)) => unavailable(format!("{}: {}", self.attributor.name(), e)),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                unavailable(format!("{} panicked: {}", self.attributor.name(), message))
            }
        }
    }
}

fn unavailable(reason: String) -> ExplanationOutcome {
    warn!("Could not generate explanation: {}", reason);
    ExplanationOutcome::unavailable(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_types::{
        AttributionError, Capabilities, Estimator, Explanation, FeatureAttribution, LabelEncoder,
        ModelError, TargetValue,
    };

    #[derive(Debug)]
    struct Stub {
        capabilities: Capabilities,
    }

    impl Estimator for Stub {
        fn name(&self) -> String {
            "stub".into()
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        fn fit(&mut self, _: &FeatureMatrix, _: &[f64]) -> Result<(), ModelError> {
            Ok(())
        }

        fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
            Ok(vec![0.0; features.n_rows()])
        }
    }

    enum Behaviour {
        Succeed,
        Fail,
        Panic,
    }

    struct Scripted(Behaviour);

    impl Attributor for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn explain(
            &self,
            model: &dyn Estimator,
            _: &FeatureMatrix,
            rows: &FeatureMatrix,
        ) -> Result<Explanation, AttributionError> {
            match self.0 {
                Behaviour::Succeed => Ok(Explanation {
                    base_values: vec![0.0; rows.n_rows()],
                    attributions: vec![FeatureAttribution {
                        feature: model.name(),
                        values: vec![0.0; rows.n_rows()],
                    }],
                }),
                Behaviour::Fail => Err(AttributionError::NonFiniteOutput),
                Behaviour::Panic => panic!("attribution blew up"),
            }
        }
    }

    fn rows() -> FeatureMatrix {
        FeatureMatrix::new(vec!["x".into()], vec![vec![1.0], vec![2.0]]).unwrap()
    }

    fn wrapped(capabilities: Capabilities) -> FittedModel {
        FittedModel::Wrapped {
            encoder: LabelEncoder::fit(&[TargetValue::Number(0.0), TargetValue::Number(1.0)]),
            estimator: Box::new(Stub { capabilities }),
        }
    }

    #[test]
    fn explains_the_inner_estimator() {
        let outcome = Explainer::new(&Scripted(Behaviour::Succeed)).explain(
            &wrapped(Capabilities::FULL),
            &rows(),
            &rows(),
        );
        let explanation = outcome.explanation().unwrap();
        assert_eq!(explanation.attributions[0].feature, "stub");
        assert_eq!(explanation.n_rows(), 2);
    }

    #[test]
    fn missing_capabilities_are_a_soft_failure() {
        let model = FittedModel::Direct(Box::new(Stub {
            capabilities: Capabilities {
                fit: false,
                predict: true,
            },
        }));
        let outcome = Explainer::new(&Scripted(Behaviour::Succeed)).explain(&model, &rows(), &rows());
        assert!(!outcome.is_available());
    }

    #[test]
    fn attribution_errors_are_a_soft_failure() {
        let outcome = Explainer::new(&Scripted(Behaviour::Fail)).explain(
            &wrapped(Capabilities::FULL),
            &rows(),
            &rows(),
        );
        match outcome {
            ExplanationOutcome::Unavailable(u) => assert!(u.reason.contains("not finite")),
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn attribution_panics_are_a_soft_failure() {
        let outcome = Explainer::new(&Scripted(Behaviour::Panic)).explain(
            &wrapped(Capabilities::FULL),
            &rows(),
            &rows(),
        );
        match outcome {
            ExplanationOutcome::Unavailable(u) => assert!(u.reason.contains("blew up")),
            other => panic!("expected unavailable, got {other:?}"),
        }
    }
}
