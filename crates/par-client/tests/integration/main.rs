mod fbref_pipeline;
mod standings_pipeline;
