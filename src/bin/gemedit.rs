//! CLI for gemedit - edit images with natural-language instructions.

use clap::{Args, Parser, Subcommand};
use gemedit::image::providers::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL};
use gemedit::{
    EditorController, EditorError, EditorState, GeminiEditor, RequestState, SourceImage,
};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gemedit")]
#[command(about = "Edit images with natural-language instructions via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    editor: EditorArgs,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one edit to an image and save the result
    Edit(EditArgs),

    /// Interactive session: upload, prompt, generate, reset, save
    Session,
}

#[derive(Args)]
struct EditorArgs {
    /// Gemini model identifier ("flash", "pro", or a full model name)
    #[arg(long, global = true, default_value = "gemini-2.5-flash-image")]
    model: String,

    /// Environment variable holding the API key
    #[arg(long, global = true, default_value = DEFAULT_API_KEY_ENV)]
    api_key_env: String,

    /// API root URL
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Args)]
struct EditArgs {
    /// Image to edit
    input: PathBuf,

    /// The edit instruction
    #[arg(short, long)]
    prompt: String,

    /// Output file path (defaults to edited.<ext> based on the returned format)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let editor = GeminiEditor::builder()
        .model(cli.editor.model.as_str())
        .api_key_env(&cli.editor.api_key_env)
        .base_url(&cli.editor.base_url)
        .build()?;
    let controller = EditorController::new(editor);

    match cli.command {
        Commands::Edit(args) => edit_once(controller, args, cli.json).await?,
        Commands::Session => run_session(controller, cli.json).await?,
    }

    Ok(())
}

async fn edit_once(
    mut controller: EditorController<GeminiEditor>,
    args: EditArgs,
    json_output: bool,
) -> anyhow::Result<()> {
    let image = SourceImage::from_path(&args.input).await?;
    controller.on_upload(image).await;
    controller.on_prompt_change(args.prompt);

    if controller.on_generate().await != RequestState::Succeeded {
        let message = controller
            .state()
            .error()
            .unwrap_or("An unknown error occurred.")
            .to_string();
        if json_output {
            let result = serde_json::json!({ "success": false, "error": message });
            println!("{}", serde_json::to_string_pretty(&result)?);
            std::process::exit(1);
        }
        anyhow::bail!(message);
    }

    let output = save_result(controller.state(), args.output.as_deref()).await?;

    if json_output {
        let image = controller.state().result();
        let result = serde_json::json!({
            "success": true,
            "output": output.path.display().to_string(),
            "size_bytes": output.size,
            "mime_type": image.map(|i| i.mime_type.clone()),
            "model": image.and_then(|i| i.metadata.model.clone()),
            "duration_ms": image.and_then(|i| i.metadata.duration_ms),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Edited image: {} ({} bytes) via {}",
            output.path.display(),
            output.size,
            controller.editor().model().as_str()
        );
    }
    Ok(())
}

struct Saved {
    path: PathBuf,
    size: usize,
}

async fn save_result(state: &EditorState, path: Option<&Path>) -> anyhow::Result<Saved> {
    let image = state
        .result()
        .ok_or_else(|| anyhow::anyhow!("no edited image to save"))?;
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let ext = image.format().map(|f| f.extension()).unwrap_or("png");
            PathBuf::from(format!("edited.{ext}"))
        }
    };
    let size = image.save(&path).await?;
    Ok(Saved { path, size })
}

const SESSION_HELP: &str = "\
Commands:
  upload <path>   select the image to edit
  prompt <text>   set the edit instruction
  generate        send the image and instruction
  save [path]     write the edited image
  status          show the current state
  reset           clear everything
  help            show this help
  quit            leave the session";

async fn run_session(
    mut controller: EditorController<GeminiEditor>,
    json_output: bool,
) -> anyhow::Result<()> {
    println!("{SESSION_HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => continue,
            "upload" => match SourceImage::from_path(rest).await {
                Ok(image) => controller.on_upload(image).await,
                Err(e) => eprintln!("upload failed: {e}"),
            },
            "prompt" => controller.on_prompt_change(rest),
            "generate" => {
                let Some(job) = controller.begin_generate() else {
                    render(controller.state(), json_output)?;
                    continue;
                };
                println!("generating...");
                let outcome = job.run(controller.editor()).await;
                let terminal = outcome.result.as_ref().is_err_and(EditorError::is_terminal);
                controller.finish_generate(outcome);
                if terminal {
                    render(controller.state(), json_output)?;
                    eprintln!("configuration error, ending session");
                    break;
                }
            }
            "save" => {
                let path = (!rest.is_empty()).then(|| Path::new(rest));
                match save_result(controller.state(), path).await {
                    Ok(saved) => println!("saved {} ({} bytes)", saved.path.display(), saved.size),
                    Err(e) => eprintln!("save failed: {e}"),
                }
                continue;
            }
            "status" => {}
            "reset" => controller.on_reset(),
            "help" => {
                println!("{SESSION_HELP}");
                continue;
            }
            "quit" | "exit" => break,
            other => {
                eprintln!("unknown command '{other}' (try 'help')");
                continue;
            }
        }

        render(controller.state(), json_output)?;
    }

    Ok(())
}

fn render(state: &EditorState, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        let view = serde_json::json!({
            "source": state.source().map(|s| serde_json::json!({
                "name": s.name,
                "media_type": s.media_type,
                "size_bytes": s.size(),
            })),
            "has_preview": state.preview().is_some(),
            "prompt": state.prompt(),
            "request_state": state.request_state(),
            "result": state.result().map(|r| serde_json::json!({
                "mime_type": r.mime_type,
                "model": r.metadata.model,
                "duration_ms": r.metadata.duration_ms,
            })),
            "error": state.error(),
            "can_generate": state.can_generate(),
        });
        println!("{}", serde_json::to_string(&view)?);
        return Ok(());
    }

    match state.source() {
        Some(s) => println!(
            "image:   {} ({}, {} bytes)",
            s.name.as_deref().unwrap_or("<unnamed>"),
            s.media_type,
            s.size()
        ),
        None => println!("image:   none"),
    }
    println!("prompt:  {:?}", state.prompt());
    println!("request: {}", state.request_state());
    if let Some(result) = state.result() {
        println!("result:  {} image ready (use 'save')", result.mime_type);
    }
    if let Some(error) = state.error() {
        println!("error:   {error}");
    }
    println!(
        "generate {}",
        if state.can_generate() { "available" } else { "unavailable" }
    );
    Ok(())
}
