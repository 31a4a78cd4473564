// src/exec/template.rs

//! Argument templates for the external tools.
//!
//! Supported placeholders:
//! - `{workdir}`: working directory (also the process cwd)
//! - `{input}` / `{input_name}`: full path / file name of the single input
//! - `{output}` / `{output_name}`: full path / file name of the output
//! - `{inputs}`: only as a whole argument; expands to one argument per input

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::exec::invocation::ExternalInvocation;

const INPUTS: &str = "{inputs}";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolTemplate {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Values substituted into a [`ToolTemplate`].
#[derive(Debug, Clone)]
pub struct ToolVars<'a> {
    pub workdir: &'a Path,
    pub input: Option<&'a Path>,
    pub inputs: &'a [PathBuf],
    pub output: Option<&'a Path>,
}

impl Default for ToolVars<'_> {
    fn default() -> Self {
        Self {
            workdir: Path::new("."),
            input: None,
            inputs: &[],
            output: None,
        }
    }
}

impl ToolTemplate {
    /// Containerised LibreOffice conversion of one slide deck to PDF.
    pub fn default_converter() -> Self {
        Self {
            program: "docker".to_string(),
            args: [
                "run",
                "--rm",
                "-v",
                "{workdir}:/data",
                "seguins/soffice",
                "bash",
                "-c",
                "soffice --headless --convert-to pdf:impress_pdf_Export /data/{input_name} && cp {output_name} /data",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }

    /// poppler's `pdfunite`.
    pub fn default_merger() -> Self {
        Self {
            program: "pdfunite".to_string(),
            args: vec![INPUTS.to_string(), "{output}".to_string()],
        }
    }

    pub fn mentions(&self, placeholder: &str) -> bool {
        self.args.iter().any(|a| a.contains(placeholder))
    }

    pub fn render(&self, vars: &ToolVars<'_>) -> ExternalInvocation {
        let mut invocation = ExternalInvocation::new(self.program.clone(), vars.workdir);

        for arg in &self.args {
            if arg == INPUTS {
                invocation = invocation.args(vars.inputs.iter().map(|p| p.display().to_string()));
            } else {
                invocation = invocation.arg(substitute(arg, vars));
            }
        }

        invocation
    }
}

fn substitute(arg: &str, vars: &ToolVars<'_>) -> String {
    let mut out = arg.replace("{workdir}", &vars.workdir.display().to_string());

    if let Some(input) = vars.input {
        out = out
            .replace("{input_name}", &file_name(input))
            .replace("{input}", &input.display().to_string());
    }
    if let Some(output) = vars.output {
        out = out
            .replace("{output_name}", &file_name(output))
            .replace("{output}", &output.display().to_string());
    }

    out
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
