use leptos::prelude::*;
use leptos_ui::variants;

variants! {
    Button {
        base: "inline-flex w-fit shrink-0 select-none items-center justify-center gap-2 whitespace-nowrap rounded-md text-sm font-medium transition-all outline-none hover:cursor-pointer active:scale-[0.98] touch-manipulation disabled:pointer-events-none disabled:opacity-50 focus-visible:ring-[3px] focus-visible:ring-ring/50 [&_svg]:pointer-events-none [&_svg]:shrink-0 [&_svg:not([class*='size-'])]:size-4",
        variants: {
            variant: {
                Default: "bg-primary text-primary-foreground shadow-xs hover:bg-primary/90",
                Secondary: "bg-secondary/90 text-secondary-foreground shadow-xs backdrop-blur hover:bg-secondary",
                Outline: "border bg-background shadow-xs hover:bg-muted",
                Ghost: "text-muted-foreground hover:bg-muted hover:text-foreground",
            },
            size: {
                Default: "h-9 px-4 py-2",
                Sm: "h-8 gap-1.5 px-3 text-xs",
            }
        },
        component: {
            element: button,
            support_href: true,
            support_aria_current: true
        }
    }
}
