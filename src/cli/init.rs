use crate::cli::Context;
use crate::error::Result;
use crate::period::write_blank_template;
use crate::settings::save_settings;

pub fn run(ctx: &Context) -> Result<()> {
    let mut settings = ctx.settings.clone();
    settings.data_dir = ctx.config.data_dir.to_string_lossy().to_string();
    settings.template_path = ctx.config.template_path.to_string_lossy().to_string();
    save_settings(&settings)?;

    std::fs::create_dir_all(&ctx.config.data_dir)?;

    let template = &ctx.config.template_path;
    if template.exists() {
        println!("Using template {}", template.display());
    } else {
        write_blank_template(template, &ctx.registry)?;
        println!("Created blank template {}", template.display());
    }

    println!("Initialized offertory at {}", ctx.config.data_dir.display());
    Ok(())
}
