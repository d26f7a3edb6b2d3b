use crate::container::ContainerDefinition;
use crate::settings::GlobalSettings;
use dockenv_runtime::RunSpec;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePull {
    pub image_ref: String,
    pub tag: String,
}

/// Remove, pause, start for a single container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallStep {
    pub container: String,
    pub remove: String,
    pub pause_ms: u64,
    pub start: RunSpec,
}

impl InstallStep {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

/// Everything an install will do, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    /// Distinct images, in install order.
    pub pulls: Vec<ImagePull>,
    pub steps: Vec<InstallStep>,
}

impl InstallPlan {
    /// `definitions` must already be in install order.
    pub fn build(
        definitions: &[ContainerDefinition],
        settings: &GlobalSettings,
        settle_delay: Duration,
    ) -> Self {
        let pause_ms = u64::try_from(settle_delay.as_millis()).unwrap_or(u64::MAX);
        let mut plan = Self::default();

        for def in definitions {
            let image_ref = settings.image_reference(&def.image);
            let pull = ImagePull {
                image_ref: image_ref.clone(),
                tag: def.image_tag.clone(),
            };
            if !plan.pulls.contains(&pull) {
                plan.pulls.push(pull);
            }

            plan.steps.push(InstallStep {
                container: def.section.clone(),
                remove: def.name.clone(),
                pause_ms,
                start: RunSpec {
                    name: def.name.clone(),
                    image_ref,
                    tag: def.image_tag.clone(),
                    ports: def.ports.iter().map(ToString::to_string).collect(),
                    links: def.links.iter().map(ToString::to_string).collect(),
                    volumes: def.volumes.iter().map(ToString::to_string).collect(),
                    options: def.options_line(),
                },
            });
        }
        plan
    }
}
