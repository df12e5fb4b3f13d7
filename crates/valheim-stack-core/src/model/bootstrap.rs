//! First-boot script
//!
//! The script is kept as lines of fragments so the deploy region can stay a
//! template reference until the engine resolves it.

use super::access::IngressRule;
use super::identity::SecretRef;
use serde::{Deserialize, Serialize};

/// Containerized game server started by the bootstrap script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameServer {
    /// Name shown in the server browser
    pub name: String,

    pub world: String,

    /// List the server publicly
    pub public: bool,

    pub crossplay: bool,

    /// Container image
    pub image: String,

    pub container_name: String,

    /// Host directory mounted at `/config`
    pub config_dir: String,

    /// Host directory mounted at `/opt/valheim`
    pub data_dir: String,
}

impl Default for GameServer {
    fn default() -> Self {
        Self {
            name: "racel".to_string(),
            world: "racelWorld".to_string(),
            public: false,
            crossplay: true,
            image: "lloesche/valheim-server".to_string(),
            container_name: "valheim-server".to_string(),
            config_dir: "/opt/valheim/config".to_string(),
            data_dir: "/opt/valheim/data".to_string(),
        }
    }
}

/// Characters that never need quoting in a shell word
fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c)
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// `value` as one shell word, quoted only when it has to be
fn shell_word(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_plain) {
        value.to_string()
    } else {
        single_quoted(value)
    }
}

/// `value` as a quoted shell string with nothing left to expand
fn shell_string(value: &str) -> String {
    if value
        .chars()
        .any(|c| matches!(c, '"' | '$' | '`' | '\\' | '!' | '\n'))
    {
        single_quoted(value)
    } else {
        format!("\"{value}\"")
    }
}

fn push_fragment(merged: &mut Vec<Fragment>, fragment: Fragment) {
    if let Fragment::Literal(s) = &fragment {
        if let Some(Fragment::Literal(prev)) = merged.last_mut() {
            prev.push_str(s);
            return;
        }
    }
    merged.push(fragment);
}

/// Piece of a script line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fragment {
    Literal(String),
    /// Region the stack is deployed into
    Region,
}

/// One shell line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLine(pub Vec<Fragment>);

impl ScriptLine {
    pub fn literal(s: impl Into<String>) -> Self {
        Self(vec![Fragment::Literal(s.into())])
    }

    pub fn render(&self, region: &str) -> String {
        self.0
            .iter()
            .map(|f| match f {
                Fragment::Literal(s) => s.as_str(),
                Fragment::Region => region,
            })
            .collect()
    }
}

/// Ordered shell commands run once at first boot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapScript {
    pub lines: Vec<ScriptLine>,
}

impl BootstrapScript {
    /// Interpreter line prepended to Linux user data
    pub const SHEBANG: &'static str = "#!/bin/bash";

    /// Install docker, fetch the server password and launch the game container
    pub fn for_server(server: &GameServer, secret: &SecretRef, ingress: &IngressRule) -> Self {
        let config_dir = shell_word(&server.config_dir);
        let data_dir = shell_word(&server.data_dir);
        let mut lines = vec![
            ScriptLine::literal("yum update -y"),
            ScriptLine::literal("yum install -y docker"),
            ScriptLine::literal("systemctl start docker"),
            ScriptLine::literal("systemctl enable docker"),
            ScriptLine::literal("usermod -a -G docker ec2-user"),
            ScriptLine::literal(format!("mkdir -p {config_dir} {data_dir}")),
            ScriptLine::literal(format!("chown -R ec2-user:ec2-user {config_dir} {data_dir}")),
            ScriptLine(vec![
                Fragment::Literal(format!(
                    "SERVER_PASS=$(aws ssm get-parameter --name {} --with-decryption --query \"Parameter.Value\" --output text --region ",
                    shell_string(&secret.parameter_name)
                )),
                Fragment::Region,
                Fragment::Literal(")".to_string()),
            ]),
        ];

        let docker_run = [
            "docker run -d \\".to_string(),
            format!("  --name {} \\", shell_word(&server.container_name)),
            "  --restart unless-stopped \\".to_string(),
            format!(
                "  -p {} \\",
                ingress.ports.publish_spec(ingress.protocol)
            ),
            format!("  -v {config_dir}:/config \\"),
            format!("  -v {data_dir}:/opt/valheim \\"),
            format!("  -e SERVER_NAME={} \\", shell_string(&server.name)),
            format!("  -e WORLD_NAME={} \\", shell_string(&server.world)),
            "  -e SERVER_PASS=\"$SERVER_PASS\" \\".to_string(),
            format!("  -e SERVER_PUBLIC={} \\", server.public),
            format!("  -e CROSSPLAY={} \\", server.crossplay),
            format!("  {}", shell_word(&server.image)),
        ];
        lines.extend(docker_run.into_iter().map(ScriptLine::literal));

        Self { lines }
    }

    /// Full script with the region filled in
    pub fn render(&self, region: &str) -> String {
        let mut out = String::from(Self::SHEBANG);
        for line in &self.lines {
            out.push('\n');
            out.push_str(&line.render(region));
        }
        out
    }

    /// Fragments of the whole script, newline-joined, adjacent literals merged
    pub fn fragments(&self) -> Vec<Fragment> {
        let mut merged = Vec::new();
        push_fragment(&mut merged, Fragment::Literal(Self::SHEBANG.to_string()));
        for line in &self.lines {
            push_fragment(&mut merged, Fragment::Literal("\n".to_string()));
            for fragment in &line.0 {
                push_fragment(&mut merged, fragment.clone());
            }
        }
        merged
    }
}
