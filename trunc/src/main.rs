use control::Control;
use coulomb::{Coulomb, PointCharge};
use dwconsts::*;
use fftgrid::FFTGrid;
use lattice::Lattice;
use log::error;
use num_traits::identities::One;
use std::error::Error;
use types::*;

fn main() {
    // first statement

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let stopwatch_main = std::time::Instant::now();

    let inpfile = std::env::args().nth(1).unwrap_or_else(|| "in.ctrl".to_string());

    if let Err(e) = run(&inpfile) {
        error!("{}", e);

        let mut source = e.source();

        while let Some(s) = source {
            error!("  caused by: {}", s);
            source = s.source();
        }

        println!("Program exited abnormally");

        std::process::exit(-1);
    }

    // computing time statistics

    println!();
    println!("   {:-^88}", " statistics ");
    println!();
    let elapsed_main_seconds = stopwatch_main.elapsed().as_secs_f64();
    println!(
        "   {:16}{:5}{:16.2} seconds {:16.2} hours",
        "Total",
        ":",
        elapsed_main_seconds,
        elapsed_main_seconds / 3600.0
    );

    // last statement
}

fn run(inpfile: &str) -> Result<(), Box<dyn Error>> {
    // read in control parameters

    let mut control = Control::new();
    control.read_file(inpfile)?;

    control.display();

    let latt = control.get_lattice();

    println!("{}", latt);
    println!();

    // FFT Grid

    let fftgrid = control.get_grid();

    println!("   FFTGrid : {}", fftgrid);
    println!();

    // truncated kernel

    let coulomb = coulomb::new(&latt, &fftgrid, &control.truncation_params())?;

    display_kernel(coulomb.as_ref(), &fftgrid);

    // point charges

    if let Some(chgfile) = control.get_charges_file() {
        let mut charges = control::read_charges(chgfile)?;

        let energy = coulomb.energy_and_grad(&mut charges)?;

        display_charges(&latt, &charges, energy);
    }

    Ok(())
}

fn display_kernel(coulomb: &dyn Coulomb, fftgrid: &FFTGrid) {
    // the kernel itself, as the image of a constant field

    let mut kernel = vec![c64::one(); fftgrid.get_n_half()];

    coulomb.apply(&mut kernel);

    let mean = kernel.iter().map(|v| v.re).sum::<f64>() / kernel.len() as f64;

    println!("   {:-^88}", format!(" {} coulomb kernel ", coulomb.name()));
    println!();
    println!("   {:<28} = {:>18.6}", "Vc(G=0)", kernel[0].re);
    println!("   {:<28} = {:>18.6}", "mean Vc(G)", mean);
    println!();
}

fn display_charges(latt: &Lattice, charges: &[PointCharge], energy: f64) {
    println!("   {:-^64}", " point-charge energy ");
    println!();
    println!(
        "   {:<28} = {:>18.10} Ha  {:>18.10} eV",
        "energy",
        energy,
        energy * HA_TO_EV
    );
    println!();

    println!("   {:-^64}", " force (cartesian) (eV/A) ");
    println!();

    for (i, pc) in charges.iter().enumerate() {
        let f = pc.get_cartesian_force(latt);

        println!(
            "    {:<3} {:>8.3} : {:>16.6} {:>16.6} {:>16.6}",
            i + 1,
            pc.z,
            f.x * FORCE_HA_TO_EV,
            f.y * FORCE_HA_TO_EV,
            f.z * FORCE_HA_TO_EV
        );
    }

    println!();
}
