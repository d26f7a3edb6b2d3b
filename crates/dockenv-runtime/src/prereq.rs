use std::fmt;
use std::process::Command;

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn command_succeeds(binary: &str, args: &[&str]) -> bool {
    Command::new(binary)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check that the docker client exists and can reach a daemon.
/// Returns a list of missing items. Empty list means all prerequisites are met.
pub fn check_docker_prereqs(binary: &str) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !command_succeeds(binary, &["--version"]) {
        missing.push(MissingPrereq {
            name: "docker",
            purpose: "pulling images and running containers",
            install_hint: "zypper install docker | apt install docker.io | dnf install moby-engine | pacman -S docker",
        });
    } else if !command_succeeds(binary, &["info"]) {
        missing.push(MissingPrereq {
            name: "docker daemon",
            purpose: "container execution",
            install_hint: "start the service (systemctl start docker) and check access to its socket",
        });
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\ndockenv needs a working docker installation to install containers.");
    msg
}
