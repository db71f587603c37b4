pub mod explorer_canvas;
