use log::*;
use mvl_core::NormalizedPixel;
use mvl_project::{
    joint_colors, AnchoredDltTriangulator, AnnotationOutcome, Error, MatrixEntrySession, Project,
};
use std::io::Write;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Clone)]
#[structopt(name = "mvl-sandbox", about = "A tool for driving multi-view labeling projects")]
struct Opt {
    /// The project folder containing cfg.json.
    #[structopt(short, long, default_value = ".")]
    project: PathBuf,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt, Clone)]
enum Command {
    /// Annotate one joint in one view of one image.
    ///
    /// When the joint is labeled in a second view this triangulates and
    /// rewrites every view's annotation; the view given here keeps the exact
    /// coordinates entered.
    Annotate {
        image: String,
        joint: String,
        view: String,
        /// Horizontal position as a fraction of the image width.
        u: f64,
        /// Vertical position as a fraction of the image height.
        v: f64,
    },
    /// Remove one joint's annotation from one view of one image.
    ///
    /// Other views keep their stored annotations untouched.
    Remove {
        image: String,
        joint: String,
        view: String,
    },
    /// Enter the per-view projection matrices interactively.
    ///
    /// Each view's matrix is entered as three rows of four numbers; an empty
    /// line keeps the row as displayed. The matrices are only committed to
    /// the project once none of them is all zero.
    Matrices,
    /// List images with missing annotations.
    Missing {
        /// Only list images where every joint is missing.
        #[structopt(long)]
        all: bool,
    },
    /// Show one image's annotations and 3d estimates.
    Show { image: String },
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(opt: Opt) -> mvl_project::Result<()> {
    let mut project = Project::open(&opt.project)?;
    let sync = project.sync().clone();
    if !sync.is_empty() {
        for name in &sync.added {
            info!("new image: {}", name);
        }
        for name in &sync.removed {
            warn!("image no longer on disk, dropping its annotations: {}", name);
        }
        project.apply_sync();
    }

    match opt.command {
        Command::Annotate {
            image,
            joint,
            view,
            u,
            v,
        } => {
            let joint = joint_index(&project, &joint)?;
            let view = view_index(&project, &view)?;
            let (mut session, table_path) =
                project.into_session(AnchoredDltTriangulator::new())?;
            let outcome = session.annotate(&image, joint, view, NormalizedPixel::new(u, v))?;
            match outcome {
                AnnotationOutcome::SingleView { .. } => {
                    info!("stored the raw click; triangulation needs a second labeled view")
                }
                AnnotationOutcome::Triangulated { point, .. } => {
                    info!("triangulated to {} and updated every view", point)
                }
            }
            session.table().save(table_path)?;
        }
        Command::Remove { image, joint, view } => {
            let joint = joint_index(&project, &joint)?;
            let view = view_index(&project, &view)?;
            let (mut session, table_path) =
                project.into_session(AnchoredDltTriangulator::new())?;
            session.remove(&image, joint, view)?;
            session.table().save(table_path)?;
        }
        Command::Matrices => enter_matrices(&mut project)?,
        Command::Missing { all } => {
            let joints: Vec<usize> = (0..project.config().joints.len()).collect();
            let table = project.table();
            for image in table.images() {
                let missing = if all {
                    table.missing_all(image, &joints)?
                } else {
                    table.missing_any(image, &joints)?
                };
                if missing {
                    println!("{}", image);
                }
            }
        }
        Command::Show { image } => {
            let config = project.config().clone();
            let (session, _) = project.into_session(AnchoredDltTriangulator::new())?;
            let colors = joint_colors(config.joints.len());
            for (ix, joint) in config.joints.iter().enumerate() {
                let [r, g, b] = colors[ix];
                println!("{} (#{:02x}{:02x}{:02x})", joint, r, g, b);
                for (view_ix, view) in config.views.iter().enumerate() {
                    match session.table().get(view_ix, &image, ix)? {
                        Some(pixel) => println!("  {}: ({:.4}, {:.4})", view, pixel.x, pixel.y),
                        None => println!("  {}: unset", view),
                    }
                }
                match session.estimate(&image, ix)? {
                    Some(point) => println!("  3d: {:.4} {:.4} {:.4}", point.x, point.y, point.z),
                    None => println!("  3d: not available"),
                }
            }
        }
    }
    Ok(())
}

fn joint_index(project: &Project, name: &str) -> mvl_project::Result<usize> {
    project
        .config()
        .joints
        .iter()
        .position(|joint| joint == name)
        .ok_or_else(|| Error::UnknownJointName(name.to_string()))
}

fn view_index(project: &Project, name: &str) -> mvl_project::Result<usize> {
    project
        .config()
        .views
        .iter()
        .position(|view| view == name)
        .ok_or_else(|| Error::UnknownViewName(name.to_string()))
}

/// Walks every view once, reading matrix rows from stdin, and commits the
/// result to the project configuration.
fn enter_matrices(project: &mut Project) -> mvl_project::Result<()> {
    let views = project.config().views.clone();
    let mut session = match project.config().matrices() {
        Ok(matrices) => MatrixEntrySession::with_matrices(views, matrices)?,
        Err(_) => MatrixEntrySession::new(views)?,
    };

    for step in 0..session.view_count() {
        println!("projection matrix for view: {}", session.view_name());
        for row in 0..3 {
            read_row(&mut session, row)?;
        }
        if step + 1 < session.view_count() {
            session.advance()?;
        }
    }

    let matrices = session.finish()?;
    project.config_mut().set_matrices(&matrices);
    project.save_config()?;
    info!("committed {} projection matrices", matrices.len());
    Ok(())
}

/// Prompts for one row of four numbers until it parses; an empty line keeps
/// the currently staged values.
fn read_row(session: &mut MatrixEntrySession, row: usize) -> mvl_project::Result<()> {
    loop {
        print!(
            "  row {} [{} {} {} {}]: ",
            row,
            session.staged_text(row, 0),
            session.staged_text(row, 1),
            session.staged_text(row, 2),
            session.staged_text(row, 3),
        );
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(());
        }
        if tokens.len() != 4 {
            println!("  expected 4 values, got {}", tokens.len());
            continue;
        }
        let mut accepted = true;
        for (col, token) in tokens.iter().enumerate() {
            if let Err(e) = session.stage(row, col, *token) {
                println!("  {}", e);
                accepted = false;
            }
        }
        if accepted {
            return Ok(());
        }
        // Put the last committed values back so a later empty line cannot
        // carry the rejected text into the commit.
        let committed = session.matrix(session.selected_view())?;
        for col in 0..4 {
            let _ = session.stage(row, col, format!("{}", committed.0[(row, col)]));
        }
    }
}
