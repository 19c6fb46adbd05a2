use anyhow::Result;

use mailprobe_lib::permutations;

use crate::args::PermuteArgs;
use crate::output;

pub fn run_permute(args: &PermuteArgs) -> Result<()> {
    let candidates = permutations(&args.first, &args.last, &args.website)?;
    output::write_lines(&candidates, args.out.as_deref())
}
