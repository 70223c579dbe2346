//! Interactive preview loop for `bone-viewer`.
//!
//! Each round asks for a snapshot path and an instruction path (blank reuses
//! the previous answer), renders, and writes a scaled-down preview image.
//! The loop ends at end of input or on `q`.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bonesketch_api_core::json::read_json_file;
use bonesketch_draw_core::{preview, save_image, CustomRegistry, DrawProgram, Renderer};

pub struct Session<'a> {
    renderer: &'a mut Renderer,
    registry: &'a CustomRegistry,
    preview_path: PathBuf,
    snapshot: Option<PathBuf>,
    instructions: Option<PathBuf>,
}

enum Answer {
    Path(PathBuf),
    Quit,
}

impl<'a> Session<'a> {
    pub fn new(renderer: &'a mut Renderer, registry: &'a CustomRegistry, preview_path: PathBuf) -> Self {
        Session {
            renderer,
            registry,
            preview_path,
            snapshot: None,
            instructions: None,
        }
    }

    /// Answers offered as defaults in the first round.
    pub fn prefill(mut self, snapshot: Option<PathBuf>, instructions: Option<PathBuf>) -> Self {
        self.snapshot = snapshot;
        self.instructions = instructions;
        self
    }

    /// Run until end of input or `q`. Returns how many previews were written.
    pub fn run(&mut self, mut input: impl BufRead, mut out: impl Write) -> Result<usize> {
        let mut written = 0;
        loop {
            let snapshot = match ask(&mut input, &mut out, "snapshot json", self.snapshot.as_deref())? {
                Some(Answer::Path(p)) => p,
                Some(Answer::Quit) | None => break,
            };
            self.snapshot = Some(snapshot.clone());

            let instructions = match ask(
                &mut input,
                &mut out,
                "drawing instructions",
                self.instructions.as_deref(),
            )? {
                Some(Answer::Path(p)) => p,
                Some(Answer::Quit) | None => break,
            };
            self.instructions = Some(instructions.clone());

            match self.render_preview(&snapshot, &instructions) {
                Ok(summary) => {
                    written += 1;
                    writeln!(out, "{summary}")?;
                }
                Err(err) => writeln!(out, "error: {err:#}")?,
            }
        }
        Ok(written)
    }

    fn render_preview(&mut self, snapshot: &Path, instructions: &Path) -> Result<String> {
        let program = DrawProgram::from_json_file(instructions, self.registry)
            .with_context(|| format!("loading {}", instructions.display()))?;
        let data = read_json_file(snapshot)?;
        let rendered = self.renderer.render(&data, &program)?;
        let config = self.renderer.config();
        let small = preview(
            &rendered.image,
            config.preview_max_width,
            config.preview_max_height,
        );
        save_image(&small, &self.preview_path)?;
        let report = &rendered.report;
        Ok(format!(
            "preview written to {} ({}x{}; {} drawn, {} skipped, {} failed)",
            self.preview_path.display(),
            small.width(),
            small.height(),
            report.drawn(),
            report.skipped(),
            report.failed()
        ))
    }
}

/// `None` at end of input.
fn ask(
    input: &mut impl BufRead,
    out: &mut impl Write,
    label: &str,
    previous: Option<&Path>,
) -> Result<Option<Answer>> {
    loop {
        match previous {
            Some(prev) => write!(out, "{label} [{}]: ", prev.display())?,
            None => write!(out, "{label}: ")?,
        }
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim();
        if answer == "q" {
            return Ok(Some(Answer::Quit));
        }
        if !answer.is_empty() {
            return Ok(Some(Answer::Path(PathBuf::from(answer))));
        }
        if let Some(prev) = previous {
            return Ok(Some(Answer::Path(prev.to_path_buf())));
        }
        writeln!(out, "a path is required")?;
    }
}
