use crate::errors::{ CvError, CvResult };
use crate::models::artifact::CodeArtifact;
use crate::traits::response_extractor::ResponseExtractor;

const FENCE: &str = "```";

/// A fenced block of a markdown response
#[derive(Debug, Clone, PartialEq, Eq)]
struct FencedBlock {
    info: String,
    body: String,
}

impl FencedBlock {
    fn is_test(&self) -> bool {
        let info = self.info.to_lowercase();
        info.contains("test")
    }
}

/// Split a response into fenced blocks and the prose around them.
/// An unterminated final block still counts.
fn split_blocks(raw: &str) -> (Vec<FencedBlock>, String) {
    let mut blocks = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in raw.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix(FENCE) {
            match current.take() {
                Some((info, body)) => {
                    blocks.push(FencedBlock {
                        info,
                        body: body.join("\n"),
                    });
                }
                None => {
                    current = Some((rest.trim().to_string(), Vec::new()));
                }
            }
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        } else if !trimmed.is_empty() {
            prose.push(trimmed);
        }
    }

    if let Some((info, body)) = current {
        blocks.push(FencedBlock {
            info,
            body: body.join("\n"),
        });
    }

    (blocks, prose.join("\n"))
}

/// Reads implementation and tests from markdown code fences.
///
/// The first block not tagged as tests is the implementation. Tests come from
/// the first block whose info string mentions `test`, else from the second
/// untagged block. A response without fences is taken as code.
#[derive(Debug, Clone, Copy, Default)]
pub struct FencedBlockExtractor;

impl ResponseExtractor for FencedBlockExtractor {
    fn extract_artifact(&self, raw: &str) -> CvResult<CodeArtifact> {
        if raw.trim().is_empty() {
            return Err(CvError::ExtractionError("empty response".to_string()));
        }

        let (blocks, explanation) = split_blocks(raw);
        if blocks.is_empty() {
            return Ok(CodeArtifact::new(raw.trim(), ""));
        }

        let mut untagged = blocks.iter().filter(|b| !b.is_test());
        let code = untagged
            .next()
            .map(|b| b.body.trim().to_string())
            .ok_or_else(|| {
                CvError::ExtractionError("response contains tests but no implementation".to_string())
            })?;

        let tests = blocks
            .iter()
            .find(|b| b.is_test())
            .or_else(|| untagged.next())
            .map(|b| b.body.trim().to_string())
            .unwrap_or_default();

        if code.is_empty() {
            return Err(CvError::ExtractionError("implementation block is empty".to_string()));
        }

        Ok(CodeArtifact {
            code,
            tests,
            explanation,
        })
    }

    fn extract_code(&self, raw: &str) -> CvResult<String> {
        let (blocks, _) = split_blocks(raw);
        let code = match blocks.first() {
            Some(block) => block.body.trim().to_string(),
            None => raw.trim().to_string(),
        };

        if code.is_empty() {
            return Err(CvError::ExtractionError("no code in repair response".to_string()));
        }
        Ok(code)
    }
}
