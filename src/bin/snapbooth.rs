use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::{SeedableRng, rngs::StdRng};
use snapbooth::{
    ContactInfo, ImagePayload, LogDelivery, Session, Step, StreamRequest, SyntheticCamera,
    TemplateCompositor, TemplateSpec, TickEvent,
};

#[derive(Parser, Debug)]
#[command(name = "snapbooth", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a photo onto the template and write the branded JPEG.
    Compose(ComposeArgs),
    /// Drive the full booth flow against the synthetic camera.
    Demo(DemoArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input photo (any format the decoder understands).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    /// Template spec JSON; built-in branding when omitted.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Seed the decorative layer for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct DemoArgs {
    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    /// Template spec JSON; built-in branding when omitted.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Skip the real-time countdown wait.
    #[arg(long)]
    quick: bool,

    /// Handle submitted at the end of the flow.
    #[arg(long, default_value = "@snapbooth")]
    handle: String,

    /// Email submitted at the end of the flow.
    #[arg(long, default_value = "demo@example.com")]
    email: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Demo(args) => cmd_demo(args),
    }
}

fn load_template(path: Option<&Path>) -> anyhow::Result<TemplateSpec> {
    let Some(path) = path else {
        return Ok(TemplateSpec::default());
    };
    let f = File::open(path).with_context(|| format!("open template '{}'", path.display()))?;
    let spec: TemplateSpec =
        serde_json::from_reader(BufReader::new(f)).context("parse template JSON")?;
    Ok(spec)
}

fn write_payload(path: &Path, payload: &ImagePayload) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, payload.as_bytes())
        .with_context(|| format!("write jpeg '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let spec = load_template(args.template.as_deref())?;
    let compositor = TemplateCompositor::new(spec)?;

    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read photo '{}'", args.in_path.display()))?;
    let input = ImagePayload::from_bytes(bytes);

    let out = match args.seed {
        Some(seed) => compositor.render(&input, &mut StdRng::seed_from_u64(seed))?,
        None => compositor.render_with_entropy(&input)?,
    };
    write_payload(&args.out, &out)
}

fn cmd_demo(args: DemoArgs) -> anyhow::Result<()> {
    let spec = load_template(args.template.as_deref())?;
    let compositor = TemplateCompositor::new(spec)?;

    let camera = SyntheticCamera::new(1080, 1920);
    let mut session = Session::new(Box::new(camera), StreamRequest::default());

    session.start()?;
    eprintln!("camera on, say cheese");

    session.request_capture()?;
    loop {
        if !args.quick {
            std::thread::sleep(std::time::Duration::from_secs(1));
        }
        match session.tick()? {
            TickEvent::Counting(v) => eprintln!("{v}..."),
            TickEvent::Captured => break,
            TickEvent::Idle => anyhow::bail!("countdown stalled (bug)"),
        }
    }
    eprintln!("captured, compositing");

    let request = session.approve()?;
    let result = compositor.render_with_entropy(&request.image);
    session.finish_processing(request.token, result)?;

    let final_image = session
        .final_image()
        .context("session has no final image after compositing")?
        .clone();

    session.advance_to_form()?;
    session.update_contact(ContactInfo::new(args.handle, args.email))?;
    session.submit(&mut LogDelivery)?;
    debug_assert_eq!(session.step(), Step::Finish);
    eprintln!("submitted, enjoy your photo");

    write_payload(&args.out, &final_image)
}
